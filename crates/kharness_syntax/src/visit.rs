//! Visitor over the PHP AST.
//!
//! [`walk`] drives a [`Visitor`] through a [`Program`] in source order, keeping track of the
//! namespace in effect so callbacks can qualify the names they see. Classes declared inside control
//! flow or function bodies (conditional declarations) are visited too.

use crate::ast::*;

/// What the walker should do after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Walk {
    /// Descend into children and continue.
    #[default]
    Continue,
    /// Do not descend into this node's children, but continue with its siblings.
    SkipChildren,
    /// Stop the walk entirely.
    Stop,
}

// ============================================================================
// Visitor trait for AST traversal
// ============================================================================

pub trait Visitor {
    /// Called for every statement before it is dispatched.
    fn visit_statement(&mut self, _namespace: Option<&str>, _stmt: &Spanned<Statement>) -> Walk {
        Walk::Continue
    }

    fn visit_class(&mut self, _namespace: Option<&str>, _class: &ClassDecl, _span: Span) -> Walk {
        Walk::Continue
    }

    fn visit_method(&mut self, _class: &ClassDecl, _method: &Spanned<MethodDecl>) -> Walk {
        Walk::Continue
    }

    fn visit_function(&mut self, _namespace: Option<&str>, _function: &FunctionDecl, _span: Span) -> Walk {
        Walk::Continue
    }
}

/// Walk `program` with `visitor`. Returns [`Walk::Stop`] if the visitor stopped early.
pub fn walk<V: Visitor + ?Sized>(program: &Program, visitor: &mut V) -> Walk {
    let mut walker = Walker { namespace: None, visitor };
    walker.statements(&program.statements)
}

/// Qualify `name` with `namespace` (`App\Tests` + `FooTest` → `App\Tests\FooTest`).
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns.trim_matches('\\'), name),
        _ => name.to_string(),
    }
}

struct Walker<'v, V: Visitor + ?Sized> {
    namespace: Option<String>,
    visitor: &'v mut V,
}

impl<V: Visitor + ?Sized> Walker<'_, V> {
    fn statements(&mut self, statements: &[Spanned<Statement>]) -> Walk {
        for stmt in statements {
            if self.statement(stmt) == Walk::Stop {
                return Walk::Stop;
            }
        }
        Walk::Continue
    }

    fn statement(&mut self, stmt: &Spanned<Statement>) -> Walk {
        match self.visitor.visit_statement(self.namespace.as_deref(), stmt) {
            Walk::Stop => return Walk::Stop,
            Walk::SkipChildren => return Walk::Continue,
            Walk::Continue => {}
        }

        match &stmt.node {
            Statement::Namespace(ns) => match &ns.body {
                // Unbraced: applies to everything that follows, until the next namespace.
                None => {
                    self.namespace = ns.name.clone();
                    Walk::Continue
                }
                Some(body) => {
                    let outer = std::mem::replace(&mut self.namespace, ns.name.clone());
                    let result = self.statements(body);
                    self.namespace = outer;
                    result
                }
            },
            Statement::Class(class) => {
                match self.visitor.visit_class(self.namespace.as_deref(), class, stmt.span) {
                    Walk::Stop => Walk::Stop,
                    Walk::SkipChildren => Walk::Continue,
                    Walk::Continue => {
                        for method in class.methods() {
                            if self.visitor.visit_method(class, method) == Walk::Stop {
                                return Walk::Stop;
                            }
                        }
                        Walk::Continue
                    }
                }
            }
            Statement::Function(function) => {
                match self.visitor.visit_function(self.namespace.as_deref(), function, stmt.span) {
                    Walk::Stop => Walk::Stop,
                    Walk::SkipChildren => Walk::Continue,
                    Walk::Continue => self.statements(&function.body),
                }
            }
            Statement::Block(body) => self.statements(body),
            Statement::Control(control) => {
                for body in &control.bodies {
                    if self.statements(body) == Walk::Stop {
                        return Walk::Stop;
                    }
                }
                Walk::Continue
            }
            Statement::Use(_) | Statement::Expression(_) | Statement::InlineHtml(_) | Statement::Nop => Walk::Continue,
        }
    }
}
