//! Watch command implementation

use crate::cli::output::format_duration;
use crate::cli::status::{build_engine, render_snapshot};
use crate::cli::{AppContext, FilterArgs, WatchArgs};
use crate::client::MonitorError;
use crate::snapshot::EngineView;
use colored::Colorize;
use std::fmt::Write;
use std::time::Duration;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Render one frame of the watch screen
pub fn render_view(view: &EngineView, filter: &FilterArgs, interval: Duration) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} every {} | category: {} | status: {} | Ctrl-C to quit",
        "apimon watch".bold(),
        format_duration(interval.as_secs()),
        filter.category,
        filter.status
    );
    if view.loading {
        let _ = writeln!(output, "{}", "Refreshing...".cyan());
    }
    if let Some(ref error) = view.last_error {
        let _ = writeln!(output, "{} {}", "Last request failed:".red(), error);
    }
    let _ = writeln!(output);

    match view.snapshot {
        Some(ref snapshot) => output.push_str(&render_snapshot(snapshot, filter, false)),
        None => {
            let _ = writeln!(output, "Waiting for the first snapshot...");
        }
    }
    output
}

/// Handle `apimon watch`
pub async fn handle_watch(args: &WatchArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let engine = build_engine(ctx)?;
    if !engine.session().is_authenticated() {
        return Err(MonitorError::Unauthenticated.into());
    }

    let interval = args
        .interval_seconds
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.monitor.refresh_interval());
    if interval.is_zero() {
        anyhow::bail!("--interval-seconds must be greater than zero");
    }

    if ctx.config.logging.writes_to_terminal() {
        tracing::debug!(
            "Logs share the terminal with the dashboard; set logging.file to keep frames intact"
        );
    }

    let mut updates = engine.subscribe();
    engine.start_auto_refresh(interval);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                print!("{}{}", CLEAR_SCREEN, render_view(&view, &args.filter, interval));
            }
            _ = &mut ctrl_c => {
                tracing::debug!("Interrupted, stopping watch");
                break;
            }
        }
    }

    // The in-flight request, if any, is abandoned with the process
    let _ = engine.stop_auto_refresh();
    Ok(())
}
