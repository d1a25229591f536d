//! Syntax diagnostics.
//!
//! Errors carry a byte span; callers attach the source text (and a file name) when rendering, either
//! through [`SyntaxError::locate`] for a one-line `line:col` form or through `miette` for a full
//! report with the offending line underlined.

use miette::{Diagnostic, SourceCode, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

/// A lexer or parser error with location information.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kharness::syntax))]
pub struct SyntaxError {
    pub message: String,
    #[label("here")]
    pub label: SourceSpan,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            label: span.into(),
            span,
        }
    }

    /// 1-based line and column of the error start within `source`.
    pub fn locate(&self, source: &str) -> (usize, usize) {
        match source.read_span(&self.label, 0, 0) {
            Ok(contents) => (contents.line() + 1, contents.column() + 1),
            Err(_) => (1, 1),
        }
    }
}
