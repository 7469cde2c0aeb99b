//! Parser for FSL, a schema language declaring access providers,
//! collections, user-defined functions and roles.
//!
//! The parser is a hand-written recursive descent over a pull lexer. It
//! produces a typed, mutable [`ast::Document`]: declarations own their
//! strings, comments and blank lines are preserved as [`ast::Extra`] trivia
//! anchored to the node that follows them, and every identifier carries an
//! optional source [`ast::Location`].
//!
//! FQL expression bodies (function bodies, predicates, computed fields) are
//! never parsed; they are captured verbatim as [`ast::Expr`] blobs by a
//! brace-balanced scan that respects string literals and comments. The
//! [`walker`] module provides the identifier-level view of those blobs that
//! the function linker builds its dependency graph from. FQL *types*, in
//! contrast, are fully parsed into [`ast::Type`].
//!
//! ## Example
//! ```rust
//! use fsl_parser::Parser;
//!
//! let input = r#"
//! collection User {
//!   name: String
//!   age: Int?
//! }
//! "#;
//! let document = Parser::new(input).parse().expect("valid schema");
//! assert_eq!(1, document.len());
//! ```
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, future_incompatible, unreachable_pub, rust_2018_idioms)]

pub mod ast;
mod error;
mod lexer;
mod parser;
pub mod walker;

pub use crate::error::Error;
pub use crate::lexer::{Token, TokenKind};
pub use crate::parser::Parser;
