//! Storage error types.

use std::path::PathBuf;

use docket_core::{DecodeError, SemanticType};
use docket_filter::FilterError;

/// Errors that can occur during storage operations.
///
/// Mutating operations surface these and leave no partial state behind; the
/// enclosing backend transaction is rolled back on failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An argument has the wrong shape (empty name, null where a value is
    /// required, and so on).
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violation.
        message: String,
    },

    /// The referenced document does not exist.
    #[error("document not found: {id}")]
    UnknownDocument {
        /// The identifier that was looked up.
        id: String,
    },

    /// The referenced column does not exist.
    #[error("column not found: {name}")]
    UnknownColumn {
        /// The name that was looked up.
        name: String,
    },

    /// A document with this identifier already exists.
    #[error("document already exists: {id}")]
    DuplicateDocument { id: String },

    /// A column with this name already exists.
    #[error("column already exists: {name}")]
    DuplicateColumn { name: String },

    /// The name is reserved for the primary-key column.
    #[error("column name {name:?} is reserved for the primary key")]
    ReservedName { name: String },

    /// A candidate value violates the column's typing predicate.
    #[error("column {column:?} expects {expected}, got {kind}")]
    TypeMismatch {
        /// The column whose predicate was violated.
        column: String,
        /// The column's declared type.
        expected: SemanticType,
        /// Variant name of the offending value.
        kind: &'static str,
    },

    /// `new_value` was called on a cell whose current value is already set.
    #[error("value already set for ({document}, {column})")]
    ValueAlreadySet { document: String, column: String },

    /// The operation requires the initial table, which is not enabled.
    #[error("the initial table is not enabled for this database")]
    InitialDisabled,

    /// The requested initial-table flag disagrees with the shape of an
    /// existing database file.
    #[error("initial table state of {path} does not match the requested flag")]
    InitialTableConflict {
        /// The durable database path.
        path: PathBuf,
    },

    /// The filter expression failed to parse.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A stored primitive could not be decoded as its declared type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A raw SQLite error.
    #[error("backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// A filesystem error while staging or committing.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    // -- Constructors --------------------------------------------------------

    /// Creates an [`StorageError::InvalidArgument`] with the given message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an [`StorageError::UnknownDocument`] for the given id.
    pub fn unknown_document(id: impl Into<String>) -> Self {
        Self::UnknownDocument { id: id.into() }
    }

    /// Creates an [`StorageError::UnknownColumn`] for the given name.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` if the error reports a missing referent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownDocument { .. } | Self::UnknownColumn { .. })
    }

    /// Returns `true` if the error reports a typing violation.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
