//! Column descriptors and the reserved primary-key name.

use serde::{Deserialize, Serialize};

use crate::types::SemanticType;

/// Name of the reserved primary-key column present in every document table.
///
/// User columns may not take this name; filters may reference it like any
/// string column.
pub const PRIMARY_KEY: &str = "index";

/// A declared column: logical name, semantic type and optional description.
///
/// The type is immutable once the column exists; renaming is not supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: SemanticType,
    pub description: Option<String>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        column_type: SemanticType,
        description: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            description: description.map(str::to_owned),
        }
    }
}
