//! Error types for the admin registry client.

use crate::client::MonitorError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error(transparent)]
    Client(#[from] MonitorError),

    /// A required field of a draft was empty. Nothing was sent.
    #[error("field '{field}' is required")]
    MissingField { field: &'static str },
}

impl AdminError {
    pub fn requires_login(&self) -> bool {
        matches!(self, AdminError::Client(e) if e.requires_login())
    }
}
