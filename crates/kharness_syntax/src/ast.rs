//! Abstract Syntax Tree definitions for the PHP subset kharness understands.
//!
//! Declarations (namespaces, classes, members, functions) are modelled in full. Everything below
//! the declaration level is a closed set of statement shapes whose expressions are opaque spans.

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start.into(), span.len())
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A possibly qualified name such as `Foo`, `Foo\Bar` or `\Foo\Bar`.
pub type Name = String;

/// A parsed file is a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Spanned<Statement>>,
}

/// Statements.
///
/// `Expression` covers every `;`-terminated statement that is not a declaration (assignments,
/// calls, `return`, `echo`, `use` inside functions, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Namespace(NamespaceDecl),
    Use(UseDecl),
    Class(ClassDecl),
    Function(FunctionDecl),
    Block(Vec<Spanned<Statement>>),
    Control(ControlStmt),
    Expression(Span),
    InlineHtml(String),
    /// Empty statement (`;`) or a bare close/open tag pair.
    Nop,
}

/// `namespace Foo\Bar;` or `namespace Foo\Bar { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// `None` for the braced global namespace (`namespace { ... }`).
    pub name: Option<Name>,
    /// `Some` for the braced form.
    pub body: Option<Vec<Spanned<Statement>>>,
}

/// `use Foo\Bar as Baz, Qux;` at file level.
#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub imports: Vec<UseImport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseImport {
    pub name: Name,
    pub alias: Option<String>,
}

/// Control-flow statement with its nested bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlStmt {
    /// Leading keyword, lowercase (`if`, `foreach`, `try`, ...).
    pub keyword: String,
    /// Every body in source order (`if` + `elseif` + `else`, `try` + `catch` + `finally`, ...).
    pub bodies: Vec<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// Class-like declaration (`class`, `interface`, `trait`, `enum`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: String,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
    pub extends: Vec<Name>,
    pub implements: Vec<Name>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<String>,
    pub members: Vec<Spanned<ClassMember>>,
}

impl ClassDecl {
    /// Iterate over the methods of this class in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Spanned<MethodDecl>> {
        self.members.iter().filter_map(|m| match &m.node {
            ClassMember::Method(method) => Some(method),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method(Spanned<MethodDecl>),
    Property(PropertyDecl),
    Constant(Vec<String>),
    TraitUse(Vec<Name>),
    EnumCase(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub visibility: Visibility,
    pub is_static: bool,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    /// Methods without an explicit modifier are public.
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<String>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Spanned<Statement>>>,
}

/// Free function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub doc_comment: Option<String>,
    pub body: Vec<Spanned<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Variable name without the leading `$`.
    pub name: String,
    pub type_hint: Option<String>,
    pub has_default: bool,
    pub variadic: bool,
    pub by_ref: bool,
    /// Constructor property promotion (`public int $x`).
    pub promoted: Option<Visibility>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(4, 10);
        let b = Span::new(2, 6);
        assert_eq!(a.merge(b), Span::new(2, 10));
    }

    #[test]
    fn test_span_to_source_span() {
        let span: miette::SourceSpan = Span::new(3, 8).into();
        assert_eq!(span.offset(), 3);
        assert_eq!(span.len(), 5);
    }
}
