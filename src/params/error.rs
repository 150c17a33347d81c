use crate::storage::StorageError;

/// Errors raised while editing or persisting the parameter set.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("parameter '{field}' is required")]
    Missing { field: &'static str },

    #[error("invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error("unknown parameter '{0}'")]
    UnknownField(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
