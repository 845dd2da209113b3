//! The closed set of semantic column types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Semantic type of a column: seven scalar forms and their homogeneous
/// list counterparts.
///
/// The set is closed. A column's type is chosen at declaration time and is
/// immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Boolean,
    String,
    Integer,
    Float,
    Date,
    Time,
    DateTime,
    ListBoolean,
    ListString,
    ListInteger,
    ListFloat,
    ListDate,
    ListTime,
    ListDateTime,
}

impl SemanticType {
    /// All fourteen types, scalars first.
    pub const ALL: [Self; 14] = [
        Self::Boolean,
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::ListBoolean,
        Self::ListString,
        Self::ListInteger,
        Self::ListFloat,
        Self::ListDate,
        Self::ListTime,
        Self::ListDateTime,
    ];

    /// Returns the string representation stored in the schema registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::ListBoolean => "list_boolean",
            Self::ListString => "list_string",
            Self::ListInteger => "list_integer",
            Self::ListFloat => "list_float",
            Self::ListDate => "list_date",
            Self::ListTime => "list_time",
            Self::ListDateTime => "list_datetime",
        }
    }

    /// Parses the registry string representation back into a type.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Returns `true` for the seven list forms.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::ListBoolean
                | Self::ListString
                | Self::ListInteger
                | Self::ListFloat
                | Self::ListDate
                | Self::ListTime
                | Self::ListDateTime
        )
    }

    /// The scalar type of a list's elements; `None` for scalar types.
    pub fn element_type(&self) -> Option<Self> {
        match self {
            Self::ListBoolean => Some(Self::Boolean),
            Self::ListString => Some(Self::String),
            Self::ListInteger => Some(Self::Integer),
            Self::ListFloat => Some(Self::Float),
            Self::ListDate => Some(Self::Date),
            Self::ListTime => Some(Self::Time),
            Self::ListDateTime => Some(Self::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SemanticType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SemanticType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown column type: {s}")))
    }
}
