use std::rc::Rc;

use thiserror::Error;

/// An `Error` type for operations performed in the lexer and the parser.
///
/// Parsing stops at the first error; the error records where it happened and
/// what the parser was looking for.
///
/// ## Example
/// ```rust
/// use fsl_parser::Parser;
///
/// let err = Parser::new("collection {")
///     .filename("bad.fsl")
///     .parse()
///     .unwrap_err();
/// assert_eq!(1, err.line());
/// assert!(err.to_string().contains("expected"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "{}:{}:{}: expected {}, found {}",
    .file.as_deref().unwrap_or("schema"),
    .line,
    .column,
    .expected,
    .found
)]
pub struct Error {
    pub(crate) file: Option<String>,
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) expected: String,
    pub(crate) found: String,
}

impl Error {
    pub(crate) fn new(
        expected: impl Into<String>,
        found: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            file: None,
            line,
            column,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn with_file(mut self, file: Option<&Rc<str>>) -> Self {
        if self.file.is_none() {
            self.file = file.map(|f| f.to_string());
        }
        self
    }

    /// The file the error was found in, if the parser was given one.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// 1-based line of the offending token.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the offending token.
    pub fn column(&self) -> usize {
        self.column
    }

    /// What the parser was looking for.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// What it found instead.
    pub fn found(&self) -> &str {
        &self.found
    }
}
