//! Error types for monitor backend calls.

use thiserror::Error;

/// Errors that can occur while talking to the monitor backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// Session is missing its role, project key or token. No request was made.
    #[error("not signed in: role, project key and token are required")]
    Unauthenticated,

    /// Session role lacks the capability for this call. No request was made.
    #[error("role '{role}' is not allowed to use the admin API")]
    Forbidden { role: String },

    /// Network failure or non-2xx response
    #[error("transport error{}: {message}", http_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    /// Payload did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl MonitorError {
    pub(crate) fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        MonitorError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Classify a reqwest error.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        if e.is_timeout() {
            MonitorError::transport(status, format!("request timed out: {}", e))
        } else if e.is_decode() {
            MonitorError::MalformedResponse(e.to_string())
        } else {
            MonitorError::transport(status, e.to_string())
        }
    }

    /// The caller should send the operator back to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, MonitorError::Unauthenticated)
    }

    /// HTTP status of a failed response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MonitorError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Transport and malformed payloads are reported to operators the same way.
    pub fn is_transport_like(&self) -> bool {
        matches!(
            self,
            MonitorError::Transport { .. } | MonitorError::MalformedResponse(_)
        )
    }

    /// Short stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::Unauthenticated => "unauthenticated",
            MonitorError::Forbidden { .. } => "forbidden",
            MonitorError::Transport { .. } => "transport",
            MonitorError::MalformedResponse(_) => "malformed_response",
        }
    }
}
