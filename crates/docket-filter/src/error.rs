//! Filter error types.

/// Errors produced while handling a filter expression.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The expression is syntactically invalid.
    #[error("parse error at offset {position}: {message}")]
    Parse {
        /// Character offset into the filter text.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },
}

impl FilterError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the filter crate.
pub type Result<T> = std::result::Result<T, FilterError>;
