//! String, heredoc and comment scanning.
//!
//! String contents are kept raw (escapes and interpolation are not evaluated); the lexer only needs
//! to know where each literal ends.

use super::{Lexer, TokenKind, is_ident_continue};

impl<'a> Lexer<'a> {
    // ========================================================================
    // Comments
    // ========================================================================

    /// Skip a `//` or `#` comment. A close tag ends the comment without being consumed.
    pub(super) fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || self.starts_with("?>") {
                break;
            }
            self.advance();
        }
    }

    /// Scan a `/* */` comment whose opening delimiter is already consumed.
    ///
    /// `/** ... */` becomes a [`TokenKind::DocComment`]; other block comments are dropped.
    pub(super) fn scan_block_comment(&mut self, start: usize) {
        let is_doc = self.starts_with("*") && !self.starts_with("*/");
        match self.rest().find("*/") {
            Some(offset) => {
                self.pos += offset + 2;
                if is_doc {
                    let text = self.source[start..self.pos].to_string();
                    self.add_token(TokenKind::DocComment(text), start);
                }
            }
            None => {
                self.pos = self.source.len();
                self.error("Unterminated block comment", start);
            }
        }
    }

    // ========================================================================
    // Quoted strings
    // ========================================================================

    pub(super) fn scan_single_quoted(&mut self, start: usize) {
        if self.skip_quoted('\'') {
            let text = self.source[start + 1..self.pos - 1].to_string();
            self.add_token(TokenKind::String(text), start);
        } else {
            self.error("Unterminated string literal", start);
        }
    }

    /// Scan a double-quoted or backtick string whose opening quote is already consumed.
    pub(super) fn scan_double_quoted(&mut self, start: usize, quote: char) {
        if self.skip_quoted(quote) {
            let text = self.source[start + 1..self.pos - 1].to_string();
            self.add_token(TokenKind::String(text), start);
        } else {
            self.error("Unterminated string literal", start);
        }
    }

    /// Advance past the closing `quote`. Returns false when the input ends first.
    fn skip_quoted(&mut self, quote: char) -> bool {
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '{' if quote != '\'' && self.peek() == Some('$') => {
                    if !self.skip_interpolation() {
                        return false;
                    }
                }
                c if c == quote => return true,
                _ => {}
            }
        }
        false
    }

    /// Skip a `{$...}` interpolation; it may contain nested quotes and braces.
    fn skip_interpolation(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(c) = self.advance() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                '\'' | '"' | '`' => {
                    if !self.skip_quoted(c) {
                        return false;
                    }
                }
                _ => {}
            }
        }
        false
    }

    // ========================================================================
    // Heredoc / nowdoc
    // ========================================================================

    /// Scan a heredoc or nowdoc whose `<<<` marker is already consumed.
    pub(super) fn scan_heredoc(&mut self, start: usize) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.advance();
                Some(q)
            }
            _ => None,
        };

        let label_start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        let label = &self.source[label_start..self.pos];

        if let Some(q) = quote {
            if self.peek() != Some(q) {
                return self.error("Unterminated heredoc label", start);
            }
            self.advance();
        }
        if self.starts_with("\r\n") {
            self.pos += 2;
        } else if self.peek() == Some('\n') {
            self.advance();
        } else {
            return self.error("Expected newline after heredoc label", start);
        }

        let body_start = self.pos;
        loop {
            let line_start = self.pos;
            let line_end = self.rest().find('\n').map(|i| line_start + i);
            let line = &self.source[line_start..line_end.unwrap_or(self.source.len())];
            let trimmed = line.trim_start_matches([' ', '\t']);

            let closes = trimmed
                .strip_prefix(label)
                .is_some_and(|after| !after.chars().next().is_some_and(is_ident_continue));
            if closes {
                let indent = line.len() - trimmed.len();
                let body = self.source[body_start..line_start]
                    .trim_end_matches('\n')
                    .trim_end_matches('\r')
                    .to_string();
                self.pos = line_start + indent + label.len();
                return self.add_token(TokenKind::String(body), start);
            }

            match line_end {
                Some(end) => self.pos = end + 1,
                None => {
                    self.pos = self.source.len();
                    return self.error(format!("Unterminated heredoc '{}'", label), start);
                }
            }
        }
    }
}
