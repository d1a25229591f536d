//! Source analysis: find the test or benchmark class in a file and its runnable methods.
//!
//! Conventions:
//! - Test classes are concrete classes named `*Test`; test methods are public instance methods
//!   without parameters whose name starts with `test` or whose doc comment has an `@test` tag.
//! - Benchmark classes are concrete classes named `*Bench` or `Benchmark*`; benchmark methods are
//!   public instance methods without parameters whose name starts with `bench`.
//! - A doc comment `@label <text>` replaces the method name as the report key.
//!
//! Only the first matching class in a file is used.

use std::path::Path;

use kharness_syntax::ast::{ClassDecl, ClassKind, MethodDecl, Span, Visibility};
use kharness_syntax::visit::{Visitor, Walk, qualify, walk};
use tracing::debug;

use super::config::RunMode;
use super::error::FileError;

/// A runnable method and the key it reports under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub key: String,
}

/// What analysis found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedInfo {
    /// Namespace-qualified class name without a leading `\`; empty when no class matched.
    pub class_name: String,
    /// Eligible methods in declaration order.
    pub methods: Vec<Method>,
}

impl ParsedInfo {
    pub fn has_class(&self) -> bool {
        !self.class_name.is_empty()
    }
}

/// Read and analyze a file.
pub fn analyze_file(path: &Path, mode: RunMode) -> Result<ParsedInfo, FileError> {
    let source = std::fs::read_to_string(path).map_err(FileError::Read)?;
    analyze_source(&source, mode)
}

/// Analyze PHP source text.
pub fn analyze_source(source: &str, mode: RunMode) -> Result<ParsedInfo, FileError> {
    let program = kharness_syntax::parse_source(source).map_err(|errors| {
        for error in &errors {
            let (line, column) = error.locate(source);
            debug!(line, column, "syntax error: {}", error.message);
        }
        let (line, column) = errors.first().map(|e| e.locate(source)).unwrap_or((1, 1));
        FileError::Parse {
            count: errors.len(),
            line,
            column,
            message: errors.first().map(|e| e.message.clone()).unwrap_or_default(),
        }
    })?;

    let mut finder = ClassFinder { mode, found: None };
    walk(&program, &mut finder);
    Ok(finder.found.unwrap_or_default())
}

/// Visitor that stops at the first class matching the mode's naming convention.
struct ClassFinder {
    mode: RunMode,
    found: Option<ParsedInfo>,
}

impl Visitor for ClassFinder {
    fn visit_class(&mut self, namespace: Option<&str>, class: &ClassDecl, _span: Span) -> Walk {
        if !is_harness_class(class, self.mode) {
            return Walk::SkipChildren;
        }

        let methods = class
            .methods()
            .filter(|m| is_harness_method(&m.node, self.mode))
            .map(|m| Method {
                name: m.node.name.clone(),
                key: label(&m.node).unwrap_or_else(|| m.node.name.clone()),
            })
            .collect();

        self.found = Some(ParsedInfo {
            class_name: qualify(namespace, &class.name).trim_start_matches('\\').to_string(),
            methods,
        });
        Walk::Stop
    }
}

fn is_harness_class(class: &ClassDecl, mode: RunMode) -> bool {
    if class.kind != ClassKind::Class || class.is_abstract {
        return false;
    }
    match mode {
        RunMode::Test => class.name.ends_with("Test"),
        RunMode::Bench => class.name.ends_with("Bench") || class.name.starts_with("Benchmark"),
    }
}

fn is_harness_method(method: &MethodDecl, mode: RunMode) -> bool {
    let callable = method.visibility == Visibility::Public
        && !method.is_static
        && !method.is_abstract
        && method.body.is_some()
        && method.params.is_empty();
    if !callable {
        return false;
    }
    match mode {
        RunMode::Test => method.name.starts_with("test") || has_doc_tag(method, "@test"),
        RunMode::Bench => method.name.starts_with("bench"),
    }
}

fn has_doc_tag(method: &MethodDecl, tag: &str) -> bool {
    method
        .doc_comment
        .as_deref()
        .is_some_and(|doc| doc.split_whitespace().any(|word| word.trim_end_matches("*/") == tag))
}

/// Text after an `@label` tag in the method's doc comment, if non-empty.
///
/// The tag must be followed by whitespace or the end of the line; `@labelled` is not a label.
fn label(method: &MethodDecl) -> Option<String> {
    let doc = method.doc_comment.as_deref()?;
    doc.lines().find_map(|line| {
        let rest = line.match_indices("@label").find_map(|(at, tag)| {
            let rest = &line[at + tag.len()..];
            rest.chars().next().is_none_or(char::is_whitespace).then_some(rest)
        })?;
        let text = rest.trim().trim_end_matches("*/").trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}
