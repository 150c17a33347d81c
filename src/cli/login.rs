//! Login and logout command implementations

use crate::cli::{AppContext, LoginArgs};
use crate::client::HttpMonitorClient;
use crate::session::SessionContext;

/// Handle `apimon login`
pub async fn handle_login(args: &LoginArgs, ctx: &AppContext) -> anyhow::Result<String> {
    let client = HttpMonitorClient::new(&ctx.config.monitor, ctx.config.status_policy)?;
    let session = client
        .login(&args.project_key, &args.api_key, args.role)
        .await?;
    ctx.sessions.save(&session)?;

    Ok(format!("✓ Signed in as {}", describe(&session)))
}

/// Handle `apimon logout`
pub fn handle_logout(ctx: &AppContext) -> anyhow::Result<String> {
    if ctx.sessions.clear()? {
        Ok("✓ Signed out".to_string())
    } else {
        Ok("Not signed in".to_string())
    }
}

fn describe(session: &SessionContext) -> String {
    let project = session.project_key.as_deref().unwrap_or("-");
    let role = session
        .role
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    match session.display_name.as_deref() {
        Some(name) => format!("{} ({}, {})", name, project, role),
        None => format!("{} ({})", project, role),
    }
}
