//! Core types for the docket document store.
//!
//! This crate contains the semantic type system, the value representation,
//! the validation/coercion rules and the codec that maps values onto
//! backend-storable primitives. It is free of any database dependency.

pub mod codec;
pub mod column;
pub mod document;
pub mod types;
pub mod validation;
pub mod value;

// Re-exports for convenience.
pub use codec::{DecodeError, StoredValue, decode, encode};
pub use column::{Column, PRIMARY_KEY};
pub use document::Document;
pub use types::SemanticType;
pub use validation::{InvalidValue, check_value, coerce};
pub use value::Value;
