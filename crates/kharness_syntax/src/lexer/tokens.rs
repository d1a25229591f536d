//! Token types for the PHP lexer.
//!
//! Keywords and punctuation carry small `Copy` ids so the parser can match on them without string
//! comparisons. PHP keywords are case-insensitive; [`keyword_id`] folds case before lookup.

use crate::ast::Span;

// ============================================================================
// VOCABULARY
// ============================================================================

/// Reserved words the parser cares about.
///
/// Words that only matter inside expressions (`instanceof`, `clone`, `print`, ...) are lexed as
/// plain identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    Abstract,
    As,
    Case,
    Catch,
    Class,
    Const,
    Declare,
    Default,
    Do,
    Else,
    ElseIf,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Enum,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    If,
    Implements,
    Interface,
    Namespace,
    New,
    Private,
    Protected,
    Public,
    Readonly,
    Static,
    Switch,
    Trait,
    Try,
    Use,
    Var,
    While,
}

const KEYWORDS: &[(&str, KeywordId)] = &[
    ("abstract", KeywordId::Abstract),
    ("as", KeywordId::As),
    ("case", KeywordId::Case),
    ("catch", KeywordId::Catch),
    ("class", KeywordId::Class),
    ("const", KeywordId::Const),
    ("declare", KeywordId::Declare),
    ("default", KeywordId::Default),
    ("do", KeywordId::Do),
    ("else", KeywordId::Else),
    ("elseif", KeywordId::ElseIf),
    ("enddeclare", KeywordId::EndDeclare),
    ("endfor", KeywordId::EndFor),
    ("endforeach", KeywordId::EndForeach),
    ("endif", KeywordId::EndIf),
    ("endswitch", KeywordId::EndSwitch),
    ("endwhile", KeywordId::EndWhile),
    ("enum", KeywordId::Enum),
    ("extends", KeywordId::Extends),
    ("final", KeywordId::Final),
    ("finally", KeywordId::Finally),
    ("fn", KeywordId::Fn),
    ("for", KeywordId::For),
    ("foreach", KeywordId::Foreach),
    ("function", KeywordId::Function),
    ("if", KeywordId::If),
    ("implements", KeywordId::Implements),
    ("interface", KeywordId::Interface),
    ("namespace", KeywordId::Namespace),
    ("new", KeywordId::New),
    ("private", KeywordId::Private),
    ("protected", KeywordId::Protected),
    ("public", KeywordId::Public),
    ("readonly", KeywordId::Readonly),
    ("static", KeywordId::Static),
    ("switch", KeywordId::Switch),
    ("trait", KeywordId::Trait),
    ("try", KeywordId::Try),
    ("use", KeywordId::Use),
    ("var", KeywordId::Var),
    ("while", KeywordId::While),
];

impl KeywordId {
    /// Canonical (lowercase) spelling.
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(s, _)| *s)
            .unwrap_or("")
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(spelling: &str) -> Option<KeywordId> {
    KEYWORDS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(spelling))
        .map(|(_, id)| *id)
}

/// Punctuation with structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Colon,
    ColonColon,
    Arrow,
    NullsafeArrow,
    FatArrow,
    Question,
    Ellipsis,
    Amp,
    Eq,
    Backslash,
}

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Tags ==========
    /// `<?php` or `<?=`
    OpenTag,
    /// `?>`
    CloseTag,
    /// Text outside of PHP tags.
    InlineHtml(String),

    // ========== Vocabulary (ID-based) ==========
    Keyword(KeywordId),
    Punctuation(PunctuationId),
    /// Any other operator, kept by spelling (`+`, `===`, `??=`, ...).
    Operator(String),

    // ========== Names and literals ==========
    /// Identifier or qualified name (`Foo`, `Foo\Bar`, `\Foo`, `namespace\Foo`).
    Ident(String),
    /// `$name`, stored without the dollar sign.
    Variable(String),
    String(String),
    Number(String),

    // ========== Trivia kept for analysis ==========
    /// `/** ... */`, full text including delimiters.
    DocComment(String),
    /// `#[`; the matching `]` is a regular [`PunctuationId::RBracket`].
    AttributeStart,

    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
