//! Canonical text output for FSL schema trees.
//!
//! The canonical form is both the public output format and the input to the
//! function linker's content hash, so it must be deterministic: fixed member
//! ordering per declaration kind, two-space indentation, verbatim expression
//! blobs re-indented to their depth, and preserved comments and blank lines
//! re-emitted at their anchors.
//!
//! An [`Encoder`] optionally records a source map while it writes and
//! appends it as an inline base64 `sourceMappingURL` comment, and the
//! [`typescript`] module derives a TypeScript declaration file from the
//! collection declarations.
//!
//! ## Example
//! ```rust
//! use fsl_parser::Parser;
//!
//! let document = Parser::new("collection User{name:String}").parse().unwrap();
//! assert_eq!(
//!     "collection User {\n  name: String\n}\n",
//!     fsl_encoder::encode(&document),
//! );
//! ```
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, future_incompatible, unreachable_pub, rust_2018_idioms)]

mod canonical;
mod source_map;
pub mod typescript;

pub use canonical::{encode, encode_declaration, Encoder};

use thiserror::Error;

/// Errors from the auxiliary JSON inputs to the encoder.
///
/// Both are recoverable: callers may log the error and encode without
/// source-map symbol information.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The `{original: mangled}` name map was not valid JSON.
    #[error("invalid mangled names JSON: {0}")]
    InvalidMangledNamesJson(#[source] serde_json::Error),
    /// The `{file: content}` sources map was not valid JSON.
    #[error("invalid sources JSON: {0}")]
    InvalidSourcesJson(#[source] serde_json::Error),
}
