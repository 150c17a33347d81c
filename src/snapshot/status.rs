//! Derived status policy.

use super::model::DerivedStatus;
use serde::{Deserialize, Serialize};

/// Thresholds used to bucket raw probe results.
///
/// | status code   | response time        | derived  |
/// |---------------|----------------------|----------|
/// | absent        | any                  | offline  |
/// | 500..=599     | any                  | offline  |
/// | 200..=299     | > `slow_threshold_ms`| slow     |
/// | 200..=299     | otherwise            | online   |
/// | anything else | any                  | unknown  |
///
/// 4xx lands in `unknown`: the endpoint answered, but not successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    /// Healthy responses slower than this are `slow`
    pub slow_threshold_ms: u64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            slow_threshold_ms: 800,
        }
    }
}

impl StatusPolicy {
    pub fn classify(
        &self,
        status_code: Option<u16>,
        response_time_ms: Option<u64>,
    ) -> DerivedStatus {
        match status_code {
            None => DerivedStatus::Offline,
            Some(500..=599) => DerivedStatus::Offline,
            Some(200..=299) => match response_time_ms {
                Some(ms) if ms > self.slow_threshold_ms => DerivedStatus::Slow,
                _ => DerivedStatus::Online,
            },
            Some(_) => DerivedStatus::Unknown,
        }
    }
}

/// Classify with the default policy.
pub fn derive_status(status_code: Option<u16>, response_time_ms: Option<u64>) -> DerivedStatus {
    StatusPolicy::default().classify(status_code, response_time_ms)
}
