//! Parsing and validation for CQL, a small content-query language.
//!
//! A query filters content by field:
//!
//! - **Comparisons**: `title ~ "release notes"`, `space = DEV`, `parent != 123`
//! - **Lists**: `label in (draft, review)`, `type not in (comment)`
//! - **Connectives**: `and`, `or`, `not`, with `and` binding tighter than `or`
//! - **Grouping**: `(label = a or label = b) and space = dev`
//!
//! Fields are `ancestor`, `creator`, `label`, `parent`, `space` (or
//! `space.key`), `title` and `type`. Each field restricts the operators and
//! values it accepts; a query that breaks those rules is rejected the same way
//! as a syntax error. Queries are case-insensitive, and values are returned
//! lowercased.
//!
//! # Example
//!
//! ```
//! use cql_query::{CqlTerm, Field, ListOperator, StringOperator, parse_cql};
//!
//! let term = parse_cql("title ~ auto and label in (test, dev)").unwrap();
//! assert_eq!(
//!     term,
//!     CqlTerm::and(
//!         CqlTerm::single(Field::Title, StringOperator::Contains, "auto"),
//!         CqlTerm::list(Field::Label, ListOperator::In, ["test", "dev"]),
//!     )
//! );
//!
//! assert!(parse_cql("parent in (123, 456)").is_err());
//! ```

#![warn(missing_docs)]

mod ast;
mod combinator;
mod error;
mod lexer;
mod lexicon;
mod parser;
mod validate;

pub use ast::{
    AtomOperator, BinOp, BinaryOperator, CqlAtom, CqlListAtom, CqlSingleAtom, CqlTerm, Field,
    ListOperator, StringOperator, UnOp, UnaryOperator,
};
pub use error::QueryError;
pub use parser::parse_cql;
pub use validate::{is_valid_atom, is_valid_operator, is_valid_value};
