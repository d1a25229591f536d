/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords and punctuation
/// - Skipping balanced token runs (`skip_balanced`, `skip_until_terminator`)
/// - Error recovery (`synchronize`)
impl Parser {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token after the current token without consuming it.
    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Span of the most recently consumed token.
    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    /// Doc comment attached to the token at `index`.
    fn doc_at(&self, index: usize) -> Option<String> {
        self.docs.get(index).cloned().flatten()
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, msg: &str) -> Result<Span, SyntaxError> {
        if self.check_punct(id) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(msg))
        }
    }

    /// Consume an identifier and return its spelling.
    fn expect_ident(&mut self, msg: &str) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here(msg)),
        }
    }

    /// Build an error at the current token, naming what was found.
    fn error_here(&self, msg: &str) -> SyntaxError {
        let token = self.peek();
        let found = describe(&token.kind);
        if matches!(token.kind, TokenKind::Eof) {
            SyntaxError::new(format!("Unexpected end of file: {}", msg), token.span)
        } else {
            SyntaxError::new(format!("{}, found {}", msg, found), token.span)
        }
    }

    /// Statement terminator: `;`, or a close tag (which is left in place).
    fn expect_terminator(&mut self) -> Result<(), SyntaxError> {
        if self.match_punct(PunctuationId::Semicolon) || matches!(self.peek().kind, TokenKind::CloseTag) {
            Ok(())
        } else {
            Err(self.error_here("Expected ';'"))
        }
    }

    // ========================================================================
    // Balanced skipping
    // ========================================================================

    /// Consume an opening bracket and everything up to and including its matching closer.
    ///
    /// The lexer already guarantees bracket balance, so this only has to count.
    fn skip_balanced(&mut self) -> Result<Span, SyntaxError> {
        let start = self.peek().span;
        let mut depth = 0usize;
        loop {
            let token = self.advance().clone();
            match token.kind {
                TokenKind::Eof => {
                    return Err(SyntaxError::new("Unexpected end of file: unbalanced delimiters", start));
                }
                TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace)
                | TokenKind::AttributeStart => depth += 1,
                TokenKind::Punctuation(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(start.merge(token.span));
                    }
                }
                _ => {}
            }
        }
    }

    /// Consume tokens up to (not including) a depth-0 token accepted by `stop`.
    ///
    /// Returns the span covered, or `None` when nothing was consumed. Reaching end of input or a
    /// depth-0 closing bracket stops the scan as well; the caller decides whether that is an error.
    fn skip_until_terminator(&mut self, stop: impl Fn(&TokenKind) -> bool) -> Option<Span> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            let kind = &self.peek().kind;
            if matches!(kind, TokenKind::Eof) {
                break;
            }
            if depth == 0 && stop(kind) {
                break;
            }
            match kind {
                TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace)
                | TokenKind::AttributeStart => depth += 1,
                TokenKind::Punctuation(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }

        if self.pos == start {
            None
        } else {
            Some(self.tokens[start].span.merge(self.previous_span()))
        }
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Skip ahead to a plausible statement boundary after an error.
    ///
    /// Always consumes at least one token so the caller's loop makes progress.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.tokens[self.pos - 1].kind.is_punctuation(PunctuationId::Semicolon) {
                return;
            }
            match &self.peek().kind {
                TokenKind::Keyword(
                    KeywordId::Class
                    | KeywordId::Interface
                    | KeywordId::Trait
                    | KeywordId::Function
                    | KeywordId::Namespace
                    | KeywordId::Abstract
                    | KeywordId::Final,
                )
                | TokenKind::CloseTag => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Human-readable token description for error messages.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::OpenTag => "'<?php'".to_string(),
        TokenKind::CloseTag => "'?>'".to_string(),
        TokenKind::InlineHtml(_) => "inline HTML".to_string(),
        TokenKind::Keyword(id) => format!("'{}'", id.as_str()),
        TokenKind::Punctuation(_) | TokenKind::Operator(_) => format!("'{}'", spelling(kind)),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Variable(name) => format!("variable '${}'", name),
        TokenKind::String(_) => "string literal".to_string(),
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::DocComment(_) => "doc comment".to_string(),
        TokenKind::AttributeStart => "'#['".to_string(),
        TokenKind::Eof => "end of file".to_string(),
    }
}

/// Source spelling of a token, used to rebuild type hints.
fn spelling(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Keyword(id) => id.as_str().to_string(),
        TokenKind::Ident(name) | TokenKind::Operator(name) | TokenKind::Number(name) => name.clone(),
        TokenKind::Variable(name) => format!("${}", name),
        TokenKind::Punctuation(p) => match p {
            PunctuationId::LParen => "(",
            PunctuationId::RParen => ")",
            PunctuationId::LBracket => "[",
            PunctuationId::RBracket => "]",
            PunctuationId::LBrace => "{",
            PunctuationId::RBrace => "}",
            PunctuationId::Semicolon => ";",
            PunctuationId::Comma => ",",
            PunctuationId::Colon => ":",
            PunctuationId::ColonColon => "::",
            PunctuationId::Arrow => "->",
            PunctuationId::NullsafeArrow => "?->",
            PunctuationId::FatArrow => "=>",
            PunctuationId::Question => "?",
            PunctuationId::Ellipsis => "...",
            PunctuationId::Amp => "&",
            PunctuationId::Eq => "=",
            PunctuationId::Backslash => "\\",
        }
        .to_string(),
        other => describe(other),
    }
}
