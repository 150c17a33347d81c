//! Admin command implementations

use crate::admin::{filter_definitions, AdminClient, EndpointDraft, UserRecord};
use crate::cli::output::{format_definitions_table, format_users_table};
use crate::cli::{
    AdminCommands, AppContext, EndpointAddArgs, EndpointUpdateArgs, EndpointsCommands,
    EndpointsListArgs, UserUpdateArgs, UsersCommands, UsersListArgs,
};
use crate::session::SessionContext;
use crate::view::paginate;

impl From<&EndpointAddArgs> for EndpointDraft {
    fn from(args: &EndpointAddArgs) -> Self {
        Self {
            name: args.name.clone(),
            url: args.url.clone(),
            method: args.method,
            category: args.category.clone(),
            description: args.description.clone(),
            sport: args.sport.clone(),
        }
    }
}

/// Overlay the flags that were given onto an existing draft
fn apply_endpoint_update(draft: &mut EndpointDraft, args: &EndpointUpdateArgs) {
    if let Some(ref name) = args.name {
        draft.name = name.clone();
    }
    if let Some(ref url) = args.url {
        draft.url = url.clone();
    }
    if let Some(method) = args.method {
        draft.method = method;
    }
    if let Some(ref category) = args.category {
        draft.category = category.clone();
    }
    if let Some(ref description) = args.description {
        draft.description = description.clone();
    }
    if let Some(ref sport) = args.sport {
        draft.sport = sport.clone();
    }
}

fn apply_user_update(user: &mut UserRecord, args: &UserUpdateArgs) {
    if let Some(ref key) = args.new_project_key {
        user.project_key = key.clone();
    }
    if let Some(ref username) = args.username {
        user.username = username.clone();
    }
    if let Some(ref api_key) = args.api_key {
        user.api_key = api_key.clone();
    }
    if let Some(role) = args.role {
        user.role = role;
    }
}

fn page_footer(page: usize, pages: usize, shown: usize, total: usize) -> String {
    format!("Page {}/{} ({} of {} shown)", page, pages, shown, total)
}

async fn list_endpoints(
    client: &AdminClient,
    session: &SessionContext,
    args: &EndpointsListArgs,
) -> anyhow::Result<String> {
    let definitions = client.list_endpoints(session).await?;
    let matching = filter_definitions(&definitions, &args.category, &args.sport);

    if args.json {
        return Ok(serde_json::to_string_pretty(&matching)?);
    }
    let (page, pages) = paginate(&matching, args.page, args.per_page);
    Ok(format!(
        "{}\n{}",
        format_definitions_table(page),
        page_footer(args.page, pages, page.len(), matching.len())
    ))
}

async fn list_users(
    client: &AdminClient,
    session: &SessionContext,
    args: &UsersListArgs,
) -> anyhow::Result<String> {
    let users = client.list_users(session).await?;
    if args.json {
        return Ok(serde_json::to_string_pretty(&users)?);
    }
    let (page, pages) = paginate(&users, args.page, args.per_page);
    Ok(format!(
        "{}\n{}",
        format_users_table(page),
        page_footer(args.page, pages, page.len(), users.len())
    ))
}

/// Handle `apimon admin ...`
pub async fn handle_admin(cmd: &AdminCommands, ctx: &AppContext) -> anyhow::Result<String> {
    let session = ctx.sessions.load()?;
    let client = AdminClient::new(&ctx.config.monitor)?;

    match cmd {
        AdminCommands::Endpoints(cmd) => match cmd {
            EndpointsCommands::List(args) => list_endpoints(&client, &session, args).await,
            EndpointsCommands::Add(args) => {
                let api_key = client
                    .create_endpoint(&session, &EndpointDraft::from(args))
                    .await?;
                Ok(format!("✓ Endpoint registered: {}", api_key))
            }
            EndpointsCommands::Update(args) => {
                let existing = client
                    .list_endpoints(&session)
                    .await?
                    .into_iter()
                    .find(|d| d.api_key == args.api_key)
                    .ok_or_else(|| anyhow::anyhow!("Endpoint not found: {}", args.api_key))?;
                let mut draft = existing.to_draft();
                apply_endpoint_update(&mut draft, args);
                client
                    .update_endpoint(&session, &args.api_key, &draft)
                    .await?;
                Ok(format!("✓ Endpoint updated: {}", args.api_key))
            }
            EndpointsCommands::Delete(args) => {
                client.delete_endpoint(&session, &args.key).await?;
                Ok(format!("✓ Endpoint deleted: {}", args.key))
            }
        },
        AdminCommands::Users(cmd) => match cmd {
            UsersCommands::List(args) => list_users(&client, &session, args).await,
            UsersCommands::Add(args) => {
                let user = UserRecord {
                    project_key: args.project_key.clone(),
                    username: args.username.clone(),
                    api_key: args.api_key.clone(),
                    role: args.role,
                };
                client.create_user(&session, &user).await?;
                Ok(format!("✓ User added: {}", user.project_key))
            }
            UsersCommands::Update(args) => {
                let mut user = client
                    .list_users(&session)
                    .await?
                    .into_iter()
                    .find(|u| u.project_key == args.project_key)
                    .ok_or_else(|| anyhow::anyhow!("User not found: {}", args.project_key))?;
                apply_user_update(&mut user, args);
                client
                    .update_user(&session, &args.project_key, &user)
                    .await?;
                Ok(format!("✓ User updated: {}", user.project_key))
            }
            UsersCommands::Delete(args) => {
                client.delete_user(&session, &args.key).await?;
                Ok(format!("✓ User deleted: {}", args.key))
            }
        },
    }
}
