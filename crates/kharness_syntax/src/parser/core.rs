/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module.
/// - Doc comments are lifted out of the token stream on construction and indexed by the
///   token they precede, so the grammar never has to step over them.

/// Where a statement list ends.
#[derive(Clone, Copy)]
enum StmtEnd {
    /// End of input (file level).
    Eof,
    /// A closing `}` (consumed by the caller).
    Brace,
    /// One of the given keywords (alternative syntax: `endif`, `else`, ...).
    Keywords(&'static [KeywordId]),
}

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors at file level by synchronizing at
///   statement/declaration boundaries, so several independent errors can be reported at once.
pub struct Parser {
    tokens: Vec<Token>,
    /// `docs[i]` is the doc comment directly preceding `tokens[i]`, if any.
    docs: Vec<Option<String>>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `kharness_syntax::lexer`; must end with `Eof`.
    pub fn new(tokens: &[Token]) -> Self {
        let mut kept = Vec::with_capacity(tokens.len());
        let mut docs = Vec::with_capacity(tokens.len());
        let mut pending_doc = None;

        for token in tokens {
            match &token.kind {
                TokenKind::DocComment(text) => pending_doc = Some(text.clone()),
                _ => {
                    kept.push(token.clone());
                    docs.push(pending_doc.take());
                }
            }
        }

        if !matches!(kept.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = kept.last().map(|t| t.span.end).unwrap_or(0);
            kept.push(Token::new(TokenKind::Eof, Span::new(end, end)));
            docs.push(None);
        }

        Self {
            tokens: kept,
            docs,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire token stream into a [`Program`].
    ///
    /// ## Errors
    /// Returns every [`SyntaxError`] found. The parser recovers after an error and keeps going
    /// so unrelated problems in the same file are all reported.
    pub fn parse(mut self) -> Result<Program, Vec<SyntaxError>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => {
                    if !matches!(stmt.node, Statement::Nop) {
                        statements.push(stmt);
                    }
                }
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(self.errors)
        }
    }
}
