//! Parser for the structural subset of PHP
//!
//! Converts a token stream into an AST. Declarations are parsed in full; statement bodies are
//! parsed down to control-flow shape, and expressions are consumed as balanced, opaque spans.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use kharness_syntax::{lexer, parser};
//!
//! let source = "<?php\nnamespace App;\nclass FooTest { public function testX(): void {} }\n";
//! let tokens = lexer::lex(source).unwrap();
//! let ast = parser::parse(&tokens).unwrap();
//! assert_eq!(ast.statements.len(), 2);
//! ```

use crate::ast::*;
use crate::diagnostics::SyntaxError;
use crate::lexer::{KeywordId, PunctuationId, Token, TokenKind};

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/stmts.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
