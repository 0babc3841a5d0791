//! Common result and error types for the Salix toolkit.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in Salix), not a
/// user-facing problem. User-facing conditions are reported through the
/// diagnostic sink and the operation still returns `Ok`.
pub type SalixResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Salix, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
