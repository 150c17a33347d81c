//! Snapshot data model: monitored endpoints, samples and summary counts.

use super::status::StatusPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Category label for endpoints registered without one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Maximum number of recent samples kept per endpoint.
pub const SAMPLE_WINDOW: usize = 5;

/// Coarse health bucket computed by [`StatusPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    /// 2xx within the slow threshold
    Online,
    /// No response, or a 5xx
    Offline,
    /// 2xx slower than the slow threshold
    Slow,
    /// Anything else (1xx, 3xx, 4xx)
    Unknown,
}

impl DerivedStatus {
    /// Online or slow: the endpoint answered successfully.
    pub fn is_responding(self) -> bool {
        matches!(self, DerivedStatus::Online | DerivedStatus::Slow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DerivedStatus::Online => "online",
            DerivedStatus::Offline => "offline",
            DerivedStatus::Slow => "slow",
            DerivedStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method an endpoint is probed with. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("Invalid HTTP method: {}", other)),
        }
    }
}

/// One historical probe of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
}

/// Fixed-size sliding window of samples, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a window from samples in any order, keeping the most recent
    /// [`SAMPLE_WINDOW`] ordered oldest first.
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut samples: Vec<Sample> = samples.into_iter().collect();
        samples.sort_by_key(|s| s.timestamp);
        let skip = samples.len().saturating_sub(SAMPLE_WINDOW);
        Self {
            samples: samples.into_iter().skip(skip).collect(),
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() >= SAMPLE_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<Sample>> for SampleWindow {
    fn from(samples: Vec<Sample>) -> Self {
        Self::from_samples(samples)
    }
}

impl From<SampleWindow> for Vec<Sample> {
    fn from(window: SampleWindow) -> Self {
        window.samples.into_iter().collect()
    }
}

/// Body of the last probe response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum ResponseBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    /// Classify raw response text: blank, JSON, or anything else.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }
}

/// One row of the monitor feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredEndpoint {
    /// Stable identifier, unique within a snapshot
    pub key: String,
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub method: HttpMethod,
    /// Absent when the endpoint was unreachable
    pub status_code: Option<u16>,
    pub derived_status: DerivedStatus,
    /// Absent on timeout
    pub response_time_ms: Option<u64>,
    /// Opaque display string from the server (e.g. "95.00%")
    pub uptime_label: String,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub recent_samples: SampleWindow,
    pub last_response_body: ResponseBody,
    /// Status string the server computed; diagnostics only
    pub reported_status: Option<String>,
}

impl MonitoredEndpoint {
    /// Category used for faceting; blank or missing maps to [`UNCATEGORIZED`].
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }

    /// Recompute `derived_status` from the raw fields.
    pub fn reclassify(&mut self, policy: &StatusPolicy) {
        self.derived_status = policy.classify(self.status_code, self.response_time_ms);
    }
}

/// Server-computed counts, trusted as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub total_apis: u64,
    pub healthy_apis: u64,
    pub failed_apis: u64,
    pub avg_response_time_ms: u64,
}

impl Summary {
    /// Healthy share of all endpoints, `None` when there are none.
    pub fn uptime_ratio(&self) -> Option<f64> {
        if self.total_apis == 0 {
            None
        } else {
            Some(self.healthy_apis as f64 / self.total_apis as f64)
        }
    }
}

/// Endpoints keyed by `key`, iterated in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointTable {
    rows: Vec<MonitoredEndpoint>,
    index: HashMap<String, usize>,
}

impl EndpointTable {
    /// Build from rows in server order. Fails with the first duplicated key.
    pub fn from_rows(rows: Vec<MonitoredEndpoint>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            if index.insert(row.key.clone(), position).is_some() {
                return Err(row.key.clone());
            }
        }
        Ok(Self { rows, index })
    }

    pub fn get(&self, key: &str) -> Option<&MonitoredEndpoint> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Replace the row with the same key in place.
    ///
    /// Returns the previous row, or gives `row` back if its key is not present.
    pub fn patch(
        &mut self,
        row: MonitoredEndpoint,
    ) -> Result<MonitoredEndpoint, MonitoredEndpoint> {
        match self.index.get(&row.key) {
            Some(&i) => Ok(std::mem::replace(&mut self.rows[i], row)),
            None => Err(row),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoredEndpoint> {
        self.rows.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn reclassify(&mut self, policy: &StatusPolicy) {
        for row in &mut self.rows {
            row.reclassify(policy);
        }
    }
}

impl Serialize for EndpointTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rows)
    }
}

/// The aggregate owned by the snapshot engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub summary: Summary,
    pub endpoints: EndpointTable,
    /// When the full refresh this snapshot came from completed
    pub fetched_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    pub fn new(summary: Summary, endpoints: EndpointTable) -> Self {
        Self {
            summary,
            endpoints,
            fetched_at: Utc::now(),
        }
    }

    /// Recompute every row's derived status.
    pub fn reclassify(&mut self, policy: &StatusPolicy) {
        self.endpoints.reclassify(policy);
    }
}
