//! Wire format of the monitor feed and its normalisation into the snapshot model.
//!
//! The backend encodes "unreachable" as status code 0 and "timed out" as a
//! response time of -1, writes naive ISO-8601 timestamps, and lists recent
//! logs newest first. All of that is smoothed out here.

use super::error::MonitorError;
use crate::snapshot::{
    EndpointTable, HttpMethod, MonitorSnapshot, MonitoredEndpoint, ResponseBody, Sample,
    SampleWindow, StatusPolicy, Summary,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct WireEndpoint {
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    response_time_ms: Option<i64>,
    #[serde(default)]
    uptime: Option<String>,
    #[serde(default)]
    last_check: Option<String>,
    #[serde(default)]
    last_5_logs: Option<Vec<WireLog>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sport: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    json_response: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireLog {
    #[serde(default)]
    log_time: Option<String>,
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    response_time_ms: Option<i64>,
}

/// Parse a timestamp with or without an offset. Naive values are UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn status_code(raw: Option<i64>) -> Option<u16> {
    raw.filter(|code| (100..=999).contains(code))
        .map(|code| code as u16)
}

fn response_time(raw: Option<i64>) -> Option<u64> {
    raw.filter(|ms| *ms >= 0).map(|ms| ms as u64)
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

fn response_body(raw: Option<Value>) -> ResponseBody {
    match raw {
        None | Some(Value::Null) => ResponseBody::Empty,
        Some(Value::String(text)) => ResponseBody::from_raw(&text),
        Some(other) => ResponseBody::Json(other),
    }
}

impl WireEndpoint {
    fn into_endpoint(self, policy: &StatusPolicy) -> MonitoredEndpoint {
        let code = status_code(self.status_code);
        let response_time_ms = response_time(self.response_time_ms);

        let samples = self
            .last_5_logs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|log| {
                let timestamp = log.log_time.as_deref().and_then(parse_timestamp);
                if timestamp.is_none() {
                    tracing::trace!(
                        key = %self.key,
                        log_time = ?log.log_time,
                        "Dropping sample without a usable timestamp"
                    );
                }
                Some(Sample {
                    timestamp: timestamp?,
                    response_time_ms: response_time(log.response_time_ms),
                    status_code: status_code(log.status_code),
                })
            });
        let recent_samples = SampleWindow::from_samples(samples);

        let method = self
            .method
            .as_deref()
            .and_then(|m| m.parse::<HttpMethod>().ok())
            .unwrap_or_default();

        MonitoredEndpoint {
            name: self.name.unwrap_or_else(|| self.key.clone()),
            url: self.url.unwrap_or_default(),
            category: non_blank(self.category),
            sport: non_blank(self.sport),
            method,
            status_code: code,
            derived_status: policy.classify(code, response_time_ms),
            response_time_ms,
            uptime_label: self.uptime.unwrap_or_default(),
            last_checked_at: self.last_check.as_deref().and_then(parse_timestamp),
            recent_samples,
            last_response_body: response_body(self.json_response),
            reported_status: non_blank(self.status),
            key: self.key,
        }
    }
}

fn parse_object(body: &str) -> Result<serde_json::Map<String, Value>, MonitorError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(MonitorError::MalformedResponse(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(MonitorError::MalformedResponse(format!("invalid JSON: {}", e))),
    }
}

/// Parse a bulk `/monitor` response.
pub(crate) fn parse_snapshot(
    body: &str,
    policy: &StatusPolicy,
) -> Result<MonitorSnapshot, MonitorError> {
    let mut object = parse_object(body)?;

    let summary = object
        .remove("summary")
        .ok_or_else(|| MonitorError::MalformedResponse("missing `summary`".to_string()))?;
    let details = object
        .remove("details")
        .ok_or_else(|| MonitorError::MalformedResponse("missing `details`".to_string()))?;

    let summary: Summary = serde_json::from_value(summary)
        .map_err(|e| MonitorError::MalformedResponse(format!("invalid `summary`: {}", e)))?;
    let details: Vec<WireEndpoint> = serde_json::from_value(details)
        .map_err(|e| MonitorError::MalformedResponse(format!("invalid `details`: {}", e)))?;

    let rows = details
        .into_iter()
        .map(|wire| wire.into_endpoint(policy))
        .collect();
    let endpoints = EndpointTable::from_rows(rows).map_err(|key| {
        MonitorError::MalformedResponse(format!("duplicate endpoint key `{}`", key))
    })?;

    Ok(MonitorSnapshot::new(summary, endpoints))
}

/// Parse a `/monitor/test/{key}` response.
pub(crate) fn parse_endpoint(
    body: &str,
    policy: &StatusPolicy,
) -> Result<MonitoredEndpoint, MonitorError> {
    let object = parse_object(body)?;

    // The backend answers unknown keys with 200 and an `error` field
    if !object.contains_key("key") {
        if let Some(Value::String(error)) = object.get("error") {
            return Err(MonitorError::MalformedResponse(format!(
                "backend reported: {}",
                error
            )));
        }
    }

    let wire: WireEndpoint = serde_json::from_value(Value::Object(object))
        .map_err(|e| MonitorError::MalformedResponse(format!("invalid endpoint: {}", e)))?;
    Ok(wire.into_endpoint(policy))
}
