//! Lexer for PHP source files
//!
//! Handles tokenization including:
//! - Open/close tags and inline HTML between them
//! - Keywords (case-insensitive), identifiers and qualified names
//! - Variables, numbers, single/double-quoted, backtick, heredoc and nowdoc strings
//! - Doc comments (kept as tokens) and regular comments (dropped)
//! - Operators and punctuation, with bracket balance tracking
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, KeywordId, PunctuationId)
//! - `strings` - String, heredoc and comment scanning

mod strings;
pub mod tokens;

pub use tokens::{KeywordId, PunctuationId, Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::SyntaxError;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// [Html] → see "<?php" / "<?=" → [Php] → see "?>" → [Html]
//                                  ↓
//                     see '(' '[' '{' "#[" → push bracket
//                     see ')' ']' '}'      → pop + check match
// ============================================================================

/// Operators longer than one character, longest first so that prefix matching picks the right one.
const MULTI_CHAR_OPERATORS: &[&str] = &[
    "<=>", "===", "!==", "**=", "??=", "<<=", ">>=", "==", "!=", "<>", "<=", ">=", "&&", "||", "??",
    "++", "--", "+=", "-=", "*=", "/=", ".=", "%=", "&=", "|=", "^=", "**", "<<", ">>",
];

/// Lexer for PHP source code.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    in_php: bool,
    /// Open brackets with their start offset, for balance errors.
    brackets: Vec<(char, usize)>,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            in_php: false,
            brackets: Vec::new(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        while !self.is_at_end() {
            if self.in_php {
                self.scan_token();
            } else {
                self.scan_inline_html();
            }
        }

        for (open, offset) in std::mem::take(&mut self.brackets) {
            self.errors.push(SyntaxError::new(
                format!("Unclosed '{}'", open),
                Span::new(offset, offset + 1),
            ));
        }

        self.tokens.push(Token::new(TokenKind::Eof, Span::new(self.pos, self.pos)));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.pos)));
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        let end = self.pos.max(start + 1);
        self.errors.push(SyntaxError::new(message, Span::new(start, end)));
    }

    // ========================================================================
    // Inline HTML
    // ========================================================================

    fn scan_inline_html(&mut self) {
        let start = self.pos;
        let (html_len, tag_len) = match find_open_tag(self.rest()) {
            Some((offset, len)) => (offset, Some(len)),
            None => (self.rest().len(), None),
        };

        self.pos += html_len;
        if html_len > 0 {
            let text = self.source[start..self.pos].to_string();
            self.add_token(TokenKind::InlineHtml(text), start);
        }

        if let Some(len) = tag_len {
            let tag_start = self.pos;
            self.pos += len;
            self.add_token(TokenKind::OpenTag, tag_start);
            self.in_php = true;
        }
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }

        let start = self.pos;
        let Some(c) = self.advance() else {
            return;
        };

        match c {
            '?' if self.peek() == Some('>') => {
                self.advance();
                self.add_token(TokenKind::CloseTag, start);
                // A single newline right after the close tag belongs to the tag.
                if self.starts_with("\r\n") {
                    self.pos += 2;
                } else if self.peek() == Some('\n') {
                    self.advance();
                }
                self.in_php = false;
            }

            // Comments and attributes
            '#' if self.peek() == Some('[') => {
                self.advance();
                self.brackets.push(('[', start));
                self.add_token(TokenKind::AttributeStart, start);
            }
            '#' => self.skip_line_comment(),
            '/' if self.peek() == Some('/') => self.skip_line_comment(),
            '/' if self.peek() == Some('*') => {
                self.advance();
                self.scan_block_comment(start);
            }

            // Strings
            '\'' => self.scan_single_quoted(start),
            '"' => self.scan_double_quoted(start, '"'),
            '`' => self.scan_double_quoted(start, '`'),
            '<' if self.starts_with("<<") && looks_like_heredoc(&self.rest()[2..]) => {
                self.pos += 2;
                self.scan_heredoc(start);
            }

            // Variables
            '$' if self.peek().is_some_and(is_ident_start) => {
                let name_start = self.pos;
                self.consume_ident_chars();
                let name = self.source[name_start..self.pos].to_string();
                self.add_token(TokenKind::Variable(name), start);
            }

            // Numbers
            '0'..='9' => self.scan_number(start),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(start),

            // Brackets
            '(' => self.open_bracket('(', PunctuationId::LParen, start),
            '[' => self.open_bracket('[', PunctuationId::LBracket, start),
            '{' => self.open_bracket('{', PunctuationId::LBrace, start),
            ')' => self.close_bracket('(', PunctuationId::RParen, start),
            ']' => self.close_bracket('[', PunctuationId::RBracket, start),
            '}' => self.close_bracket('{', PunctuationId::RBrace, start),

            // Names
            '\\' if self.peek().is_some_and(is_ident_start) => self.scan_name(start),
            _ if is_ident_start(c) => self.scan_name(start),

            _ => self.scan_operator(c, start),
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn scan_operator(&mut self, first: char, start: usize) {
        // `first` is already consumed; match multi-char spellings against the full text.
        let text = &self.source[start..];
        if text.starts_with("...") {
            self.pos = start + 3;
            return self.add_punct(PunctuationId::Ellipsis, start);
        }
        if text.starts_with("?->") {
            self.pos = start + 3;
            return self.add_punct(PunctuationId::NullsafeArrow, start);
        }
        for (spelling, id) in [
            ("::", PunctuationId::ColonColon),
            ("->", PunctuationId::Arrow),
            ("=>", PunctuationId::FatArrow),
        ] {
            if text.starts_with(spelling) {
                self.pos = start + spelling.len();
                return self.add_punct(id, start);
            }
        }
        if let Some(op) = MULTI_CHAR_OPERATORS.iter().find(|op| text.starts_with(**op)) {
            self.pos = start + op.len();
            return self.add_token(TokenKind::Operator(op.to_string()), start);
        }

        match first {
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ',' => self.add_punct(PunctuationId::Comma, start),
            ':' => self.add_punct(PunctuationId::Colon, start),
            '?' => self.add_punct(PunctuationId::Question, start),
            '&' => self.add_punct(PunctuationId::Amp, start),
            '=' => self.add_punct(PunctuationId::Eq, start),
            '\\' => self.add_punct(PunctuationId::Backslash, start),
            '+' | '-' | '*' | '/' | '%' | '.' | '<' | '>' | '!' | '|' | '^' | '~' | '@' | '$' => {
                self.add_token(TokenKind::Operator(first.to_string()), start)
            }
            _ => self.error(format!("Unexpected character '{}'", first), start),
        }
    }

    /// Emit a bracket token and track it for balance checking.
    fn open_bracket(&mut self, open: char, id: PunctuationId, start: usize) {
        self.brackets.push((open, start));
        self.add_punct(id, start);
    }

    /// Emit a closing bracket token, reporting unmatched or mismatched closers.
    fn close_bracket(&mut self, expected_open: char, id: PunctuationId, start: usize) {
        match self.brackets.pop() {
            Some((open, _)) if open == expected_open => {}
            Some((open, offset)) => {
                self.error(
                    format!(
                        "Mismatched closing bracket: '{}' opened at byte {} closed by '{}'",
                        open,
                        offset,
                        &self.source[start..self.pos]
                    ),
                    start,
                );
            }
            None => self.error("Unmatched closing bracket", start),
        }
        self.add_punct(id, start);
    }

    // ========================================================================
    // Identifier, name and number scanning
    // ========================================================================

    fn consume_ident_chars(&mut self) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan an identifier or a `\`-qualified name.
    fn scan_name(&mut self, start: usize) {
        self.consume_ident_chars();
        while self.peek() == Some('\\') && self.peek_next().is_some_and(is_ident_start) {
            self.advance();
            self.consume_ident_chars();
        }

        let spelling = &self.source[start..self.pos];
        if !spelling.contains('\\') {
            if let Some(id) = keyword_id(spelling) {
                return self.add_token(TokenKind::Keyword(id), start);
            }
        }
        self.add_token(TokenKind::Ident(spelling.to_string()), start);
    }

    fn scan_number(&mut self, start: usize) {
        let mut seen_dot = self.source[start..].starts_with('.');
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    let exponent = matches!(c, 'e' | 'E')
                        && !self.source[start..self.pos].starts_with("0x")
                        && !self.source[start..self.pos].starts_with("0X");
                    self.advance();
                    if exponent && matches!(self.peek(), Some('+') | Some('-')) {
                        self.advance();
                    }
                }
                Some('.') if !seen_dot && self.peek_next().is_some_and(|c| c.is_ascii_digit()) => {
                    seen_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }
        let text = self.source[start..self.pos].to_string();
        self.add_token(TokenKind::Number(text), start);
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// PHP identifiers may contain any byte >= 0x80.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Find the next open tag in inline HTML. Returns (offset, tag length).
fn find_open_tag(text: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("<?") {
        let offset = search_from + rel;
        let after = &text[offset + 2..];
        if after.starts_with('=') {
            return Some((offset, 3));
        }
        // Byte-wise: the text after `<?` may start with a multi-byte character.
        if after.as_bytes().get(..3).is_some_and(|tag| tag.eq_ignore_ascii_case(b"php")) {
            let terminated = after[3..].chars().next().is_none_or(|c| c.is_whitespace());
            if terminated {
                return Some((offset, 5));
            }
        }
        search_from = offset + 2;
    }
    None
}

/// Text after `<<<` starts with an optional quote and a label.
fn looks_like_heredoc(after_marker: &str) -> bool {
    let rest = after_marker.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix(['"', '\'']).unwrap_or(rest);
    rest.chars().next().is_some_and(is_ident_start)
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<SyntaxError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_inline_html_and_tags() {
        let tokens = kinds("hello <?php echo 1; ?>\nbye");
        assert!(matches!(&tokens[0], TokenKind::InlineHtml(s) if s == "hello "));
        assert_eq!(tokens[1], TokenKind::OpenTag);
        assert!(matches!(&tokens[2], TokenKind::Ident(s) if s == "echo"));
        assert!(matches!(&tokens[3], TokenKind::Number(n) if n == "1"));
        assert!(tokens[4].is_punctuation(PunctuationId::Semicolon));
        assert_eq!(tokens[5], TokenKind::CloseTag);
        assert!(matches!(&tokens[6], TokenKind::InlineHtml(s) if s == "bye"));
        assert_eq!(tokens[7], TokenKind::Eof);
    }

    #[test]
    fn test_file_without_open_tag_is_html() {
        let tokens = kinds("just text");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0], TokenKind::InlineHtml(_)));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = kinds("<?php CLASS Foo Extends Bar {}");
        assert!(tokens[1].is_keyword(KeywordId::Class));
        assert!(matches!(&tokens[2], TokenKind::Ident(s) if s == "Foo"));
        assert!(tokens[3].is_keyword(KeywordId::Extends));
    }

    #[test]
    fn test_qualified_names() {
        let tokens = kinds("<?php new \\PHPUnit\\Framework\\TestCase(); use A\\B;");
        assert!(tokens[1].is_keyword(KeywordId::New));
        assert!(matches!(&tokens[2], TokenKind::Ident(s) if s == "\\PHPUnit\\Framework\\TestCase"));
        assert!(matches!(&tokens[7], TokenKind::Ident(s) if s == "A\\B"));
    }

    #[test]
    fn test_variables_and_arrows() {
        let tokens = kinds("<?php $this->run(); $x?->y; Foo::bar();");
        assert!(matches!(&tokens[1], TokenKind::Variable(s) if s == "this"));
        assert!(tokens[2].is_punctuation(PunctuationId::Arrow));
        assert!(tokens[8].is_punctuation(PunctuationId::NullsafeArrow));
        assert!(tokens[12].is_punctuation(PunctuationId::ColonColon));
    }

    #[test]
    fn test_operators_longest_match() {
        let tokens = kinds("<?php $a === $b; $c ??= 1; $d <=> $e;");
        assert!(matches!(&tokens[2], TokenKind::Operator(s) if s == "==="));
        assert!(matches!(&tokens[6], TokenKind::Operator(s) if s == "??="));
        assert!(matches!(&tokens[10], TokenKind::Operator(s) if s == "<=>"));
    }

    #[test]
    fn test_comments_dropped_doc_comments_kept() {
        let tokens = kinds("<?php // line\n# hash\n/* block */ /** doc */ $x;");
        assert!(matches!(&tokens[1], TokenKind::DocComment(s) if s == "/** doc */"));
        assert!(matches!(&tokens[2], TokenKind::Variable(s) if s == "x"));
    }

    #[test]
    fn test_attribute_start() {
        let tokens = kinds("<?php #[Attr] function f() {}");
        assert_eq!(tokens[1], TokenKind::AttributeStart);
        assert!(tokens[3].is_punctuation(PunctuationId::RBracket));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("<?php 42 3.14 1_000 0x1F 1e9 .5;");
        let numbers: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                TokenKind::Number(n) => Some(n.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec!["42", "3.14", "1_000", "0x1F", "1e9", ".5"]);
    }

    #[test]
    fn test_unmatched_closing_bracket() {
        let errors = lex("<?php }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unmatched closing bracket"));
    }

    #[test]
    fn test_unclosed_bracket() {
        let errors = lex("<?php class Foo {").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unclosed '{'"));
    }

    #[test]
    fn test_mismatched_bracket() {
        let errors = lex("<?php foo(];").unwrap_err();
        assert!(errors[0].message.contains("Mismatched"));
    }

    #[test]
    fn test_multibyte_text_after_question_tag() {
        let tokens = kinds("<?php class A {} ?>\n<?ééà\n");
        assert!(matches!(tokens.last(), Some(TokenKind::Eof)));
        assert!(tokens.iter().any(|t| matches!(t, TokenKind::InlineHtml(s) if s == "<?ééà\n")));

        let tokens = kinds("<?0\u{1B155}");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0], TokenKind::InlineHtml(_)));
    }

    #[test]
    fn test_close_tag_inside_block() {
        let tokens = kinds("<?php if ($x) { ?>html<?php } ?>");
        assert!(tokens.iter().any(|t| matches!(t, TokenKind::InlineHtml(s) if s == "html")));
    }
}
