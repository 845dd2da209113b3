//! SQLite-backed storage for the docket document store.
//!
//! The entry point is [`Database`]: a handle over a staged working copy of a
//! durable SQLite file, carrying a runtime-extensible typed schema, per-cell
//! current/baseline pairs and the filter query engine.
//!
//! ```no_run
//! use docket_storage::{Database, SemanticType, Value};
//!
//! # fn main() -> docket_storage::Result<()> {
//! let db = Database::open("scans.db", false)?;
//! db.add_column("PatientName", SemanticType::String, Some("Name of the patient"))?;
//! db.add_document("document1")?;
//! db.new_value("document1", "PatientName", Value::from("test"), None)?;
//! for doc in db.filter_documents(r#"PatientName == "test""#)? {
//!     println!("{}", doc.id());
//! }
//! db.save_modifications()?;
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod database;
mod documents;
pub mod error;
mod schema;
mod search;
mod staging;

pub use database::Database;
pub use error::{Result, StorageError};

// Re-export the core vocabulary so most callers need only this crate.
pub use docket_core::{Column, Document, PRIMARY_KEY, SemanticType, Value};
