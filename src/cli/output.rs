//! Output formatting helpers for CLI commands

use crate::admin::{EndpointDefinition, UserRecord};
use crate::params::{ParamField, ParameterSet};
use crate::snapshot::{DerivedStatus, MonitorSnapshot, MonitoredEndpoint, ResponseBody};
use crate::view::StatusCounts;
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;
use std::fmt::Write;

/// Longest response body excerpt shown by `apimon test`
const BODY_EXCERPT_CHARS: usize = 600;

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Colored status label
pub fn status_label(status: DerivedStatus) -> String {
    match status {
        DerivedStatus::Online => "Online".green().to_string(),
        DerivedStatus::Slow => "Slow".yellow().to_string(),
        DerivedStatus::Offline => "Offline".red().to_string(),
        DerivedStatus::Unknown => "Unknown".magenta().to_string(),
    }
}

/// Get status icon for a derived status
pub fn status_icon(status: DerivedStatus) -> &'static str {
    match status {
        DerivedStatus::Online => "✓",
        DerivedStatus::Slow => "~",
        DerivedStatus::Offline => "✗",
        DerivedStatus::Unknown => "?",
    }
}

fn status_code_text(code: Option<u16>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

fn response_time_text(ms: Option<u64>) -> String {
    ms.map(|ms| format!("{}ms", ms))
        .unwrap_or_else(|| "timeout".to_string())
}

fn timestamp_text(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format duration in a human-readable way
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Summary line block shown above the endpoint table
pub fn format_summary(snapshot: &MonitorSnapshot, shown: &[&MonitoredEndpoint]) -> String {
    let mut output = String::new();
    let summary = &snapshot.summary;
    let age = (Utc::now() - snapshot.fetched_at).num_seconds().max(0) as u64;

    let uptime = summary
        .uptime_ratio()
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string());

    let _ = writeln!(
        output,
        "Total: {}  Healthy: {}  Failed: {}  Avg: {}ms  Uptime: {}",
        summary.total_apis,
        summary.healthy_apis.to_string().green(),
        summary.failed_apis.to_string().red(),
        summary.avg_response_time_ms,
        uptime
    );

    let counts = StatusCounts::from_rows(shown.iter().copied());
    let _ = writeln!(
        output,
        "Showing {} of {} ({} online, {} slow, {} offline, {} unknown), fetched {} ago",
        shown.len(),
        snapshot.endpoints.len(),
        counts.online,
        counts.slow,
        counts.offline,
        counts.unknown,
        format_duration(age)
    );
    output
}

/// Format endpoint rows as a table
pub fn format_endpoints_table(rows: &[&MonitoredEndpoint]) -> String {
    let mut table = table();
    table.set_header(vec![
        "Key", "Name", "Category", "Status", "Code", "Time", "Uptime", "Last Check",
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.key),
            Cell::new(&row.name),
            Cell::new(row.category_label()),
            Cell::new(status_label(row.derived_status)),
            Cell::new(status_code_text(row.status_code)),
            Cell::new(response_time_text(row.response_time_ms)),
            Cell::new(&row.uptime_label),
            Cell::new(timestamp_text(row.last_checked_at)),
        ]);
    }

    table.to_string()
}

/// Format a projected snapshot as JSON
pub fn format_snapshot_json(snapshot: &MonitorSnapshot, rows: &[&MonitoredEndpoint]) -> String {
    serde_json::to_string_pretty(&json!({
        "summary": snapshot.summary,
        "fetched_at": snapshot.fetched_at,
        "counts": StatusCounts::from_rows(rows.iter().copied()),
        "endpoints": rows,
    }))
    .unwrap_or_default()
}

fn body_excerpt(body: &ResponseBody) -> String {
    let text = match body {
        ResponseBody::Empty => return "(empty)".dimmed().to_string(),
        ResponseBody::Json(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
        ResponseBody::Text(text) => text.clone(),
    };
    if text.chars().count() > BODY_EXCERPT_CHARS {
        let cut: String = text.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{}\n… (truncated)", cut)
    } else {
        text
    }
}

/// Format one re-tested endpoint with its recent samples
pub fn format_endpoint_detail(row: &MonitoredEndpoint) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} {} ({})",
        status_icon(row.derived_status),
        row.name.bold(),
        row.key
    );
    let _ = writeln!(output, "  {} {}", row.method, row.url);
    let _ = writeln!(output, "  Status:   {}", status_label(row.derived_status));
    let _ = writeln!(output, "  Code:     {}", status_code_text(row.status_code));
    let _ = writeln!(output, "  Time:     {}", response_time_text(row.response_time_ms));
    let _ = writeln!(output, "  Uptime:   {}", row.uptime_label);
    let _ = writeln!(output, "  Checked:  {}", timestamp_text(row.last_checked_at));

    if !row.recent_samples.is_empty() {
        let mut samples = table();
        samples.set_header(vec!["Time", "Code", "Response"]);
        for sample in row.recent_samples.iter() {
            samples.add_row(vec![
                Cell::new(sample.timestamp.format("%Y-%m-%d %H:%M:%S")),
                Cell::new(status_code_text(sample.status_code)),
                Cell::new(response_time_text(sample.response_time_ms)),
            ]);
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Recent checks:");
        let _ = writeln!(output, "{}", samples);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Response:");
    let _ = writeln!(output, "{}", body_excerpt(&row.last_response_body));
    output
}

/// Format the parameter set as a table
pub fn format_params_table(params: &ParameterSet) -> String {
    let mut table = table();
    table.set_header(vec!["Field", "Header", "Value"]);
    for field in ParamField::ALL {
        table.add_row(vec![
            Cell::new(field),
            Cell::new(field.header_name()),
            Cell::new(params.get(field)),
        ]);
    }
    table.to_string()
}

/// Format registry definitions as a table
pub fn format_definitions_table(definitions: &[&EndpointDefinition]) -> String {
    let mut table = table();
    table.set_header(vec!["API Key", "Name", "Method", "Category", "Sport", "URL"]);
    for def in definitions {
        table.add_row(vec![
            Cell::new(&def.api_key),
            Cell::new(&def.name),
            Cell::new(def.method),
            Cell::new(def.category_label()),
            Cell::new(def.sport_label()),
            Cell::new(&def.url),
        ]);
    }
    table.to_string()
}

/// Format users as a table. API keys are masked.
pub fn format_users_table(users: &[UserRecord]) -> String {
    let mut table = table();
    table.set_header(vec!["Project Key", "Username", "Role", "API Key"]);
    for user in users {
        table.add_row(vec![
            Cell::new(&user.project_key),
            Cell::new(&user.username),
            Cell::new(user.role),
            Cell::new(mask_secret(&user.api_key)),
        ]);
    }
    table.to_string()
}

/// Keep the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
