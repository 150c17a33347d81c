//! Shared test utilities for apimon integration tests.
//!
//! Builders for monitor feed payloads, sessions and configs pointed at a
//! wiremock server.

#![allow(dead_code)]

use apimon::config::MonitorConfig;
use apimon::session::{Role, SessionContext};
use serde_json::{json, Value};

// =============================================================================
// Well-Known Test Constants
// =============================================================================

pub const PROJECT_KEY: &str = "RS_P_1834366022682058753";
pub const TOKEN: &str = "v5sRS_P_token";

// =============================================================================
// Sessions and config
// =============================================================================

pub fn user_session() -> SessionContext {
    SessionContext::new(Role::User, PROJECT_KEY, TOKEN)
}

pub fn admin_session() -> SessionContext {
    SessionContext::new(Role::Admin, PROJECT_KEY, TOKEN)
}

/// Monitor config pointed at `base_url` with a short timeout.
pub fn monitor_config(base_url: &str) -> MonitorConfig {
    MonitorConfig {
        base_url: base_url.to_string(),
        refresh_interval_seconds: 300,
        timeout_seconds: 2,
        forward_parameters: true,
    }
}

// =============================================================================
// Feed Builders
// =============================================================================

/// One endpoint row as the backend serializes it.
pub fn wire_row(key: &str, category: &str, status_code: i64, response_time_ms: i64) -> Value {
    json!({
        "key": key,
        "name": format!("{} api", key),
        "url": format!("https://api.example.com/v5/{}", key),
        "status": if (200..300).contains(&status_code) { "online" } else { "offline" },
        "status_code": status_code,
        "response_time_ms": response_time_ms,
        "uptime": "100.00%",
        "last_check": "2025-03-01T10:15:30.123456",
        "last_5_logs": [
            {
                "log_time": "2025-03-01T10:15:30.123456",
                "status_code": status_code,
                "response_time_ms": response_time_ms
            },
            {"log_time": "2025-03-01T10:10:30.000000", "status_code": 200, "response_time_ms": 210}
        ],
        "category": category,
        "sport": "cricket",
        "json_response": "{\"data\": {\"ok\": true}}"
    })
}

/// A `/monitor` body with a summary computed from `rows`.
pub fn feed(rows: Vec<Value>) -> Value {
    let total = rows.len();
    let healthy = rows
        .iter()
        .filter(|r| {
            r["status_code"]
                .as_i64()
                .map(|c| (200..300).contains(&c))
                .unwrap_or(false)
        })
        .count();
    json!({
        "summary": {
            "total_apis": total,
            "healthy_apis": healthy,
            "failed_apis": total - healthy,
            "avg_response_time_ms": 250
        },
        "details": rows
    })
}
