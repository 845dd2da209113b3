//! Filter expression language for the docket document store.
//!
//! A filter is a small boolean expression over column values, e.g.
//! `format == "NIFTI" AND "b" IN strings`. This crate parses the textual
//! form into an AST ([`Expr`]), lowers it to a SQL `WHERE` fragment when the
//! whole expression is expressible ([`lower`]), and evaluates it in memory
//! against decoded documents otherwise ([`matches`]). The two paths agree on
//! every expression both can handle.

pub mod ast;
pub mod compile;
pub mod error;
pub mod eval;
mod parser;
mod token;

pub use ast::{CmpOp, Expr};
pub use compile::{SqlFilter, lower, quote_ident};
pub use error::FilterError;
pub use eval::{list_elements, matches};
pub use parser::parse;
