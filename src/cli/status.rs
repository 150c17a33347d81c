//! Status command implementation

use crate::cli::output::{format_endpoints_table, format_snapshot_json, format_summary};
use crate::cli::{AppContext, FilterArgs, StatusArgs};
use crate::client::HttpMonitorClient;
use crate::snapshot::{MonitorSnapshot, SnapshotEngine};
use crate::view::project;
use std::sync::Arc;

/// Build an engine around the saved session and parameter set.
pub fn build_engine(ctx: &AppContext) -> anyhow::Result<Arc<SnapshotEngine>> {
    let session = ctx.sessions.load()?;
    let params = ctx.params.load()?;
    let policy = ctx.config.status_policy;
    let client = HttpMonitorClient::new(&ctx.config.monitor, policy)?;

    tracing::debug!(
        base_url = %client.base_url(),
        authenticated = session.is_authenticated(),
        "Engine created"
    );
    Ok(Arc::new(SnapshotEngine::new(
        Arc::new(client),
        session,
        params,
        policy,
    )))
}

/// Render a snapshot projection as text or JSON.
pub fn render_snapshot(snapshot: &MonitorSnapshot, filter: &FilterArgs, json: bool) -> String {
    let rows = project(snapshot, &filter.category, filter.status);
    if json {
        format_snapshot_json(snapshot, &rows)
    } else {
        format!(
            "{}\n{}",
            format_summary(snapshot, &rows),
            format_endpoints_table(&rows)
        )
    }
}

/// Handle `apimon status`
pub async fn handle_status(args: &StatusArgs, ctx: &AppContext) -> anyhow::Result<String> {
    let engine = build_engine(ctx)?;
    engine.refresh().await?;

    let snapshot = engine
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("no snapshot available after refresh"))?;
    Ok(render_snapshot(&snapshot, &args.filter, args.json))
}
