//! PHP syntax frontend for kharness: lexer, parser, AST, visitor.
//!
//! The grammar covered here is the structural subset needed to locate classes, their members and the
//! shape of method signatures. Statement and expression bodies are kept as opaque spans: they are
//! checked for balanced delimiters and correct termination, but not interpreted.
//!
//! ## Examples
//! ```rust,no_run
//! use kharness_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("<?php class FooTest { public function testX() {} }").unwrap();
//! let program = parser::parse(&tokens).unwrap();
//! assert_eq!(program.statements.len(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod visit;

pub use diagnostics::SyntaxError;

/// Lex and parse a source string in one go.
///
/// Lexer errors short-circuit parsing: a token stream with holes in it only produces cascaded
/// parser errors.
pub fn parse_source(source: &str) -> Result<ast::Program, Vec<SyntaxError>> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}
