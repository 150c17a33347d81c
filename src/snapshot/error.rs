//! Error types for the snapshot engine.

use crate::client::MonitorError;
use thiserror::Error;

/// Errors surfaced by [`super::SnapshotEngine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The backend call failed; the snapshot was left as it was
    #[error(transparent)]
    Client(#[from] MonitorError),

    /// Test-now for a key the current snapshot does not contain
    #[error("endpoint `{key}` is not in the current snapshot")]
    Consistency { key: String },

    /// Test-now before any full refresh succeeded
    #[error("no snapshot loaded yet; cannot test `{key}`")]
    NoSnapshot { key: String },
}

impl EngineError {
    pub fn requires_login(&self) -> bool {
        matches!(self, EngineError::Client(e) if e.requires_login())
    }

    /// Registry and snapshot disagree about which keys exist.
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            EngineError::Consistency { .. } | EngineError::NoSnapshot { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Client(e) => e.kind(),
            EngineError::Consistency { .. } | EngineError::NoSnapshot { .. } => "consistency",
        }
    }
}
