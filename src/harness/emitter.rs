//! PHP code emitter - builds driver script source text
//!
//! Indentation-aware line buffer plus the literal escaping drivers need.

/// A buffer for building PHP source code with proper indentation
#[derive(Debug, Default)]
pub struct PhpEmitter {
    buffer: String,
    indent_level: usize,
}

impl PhpEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        for _ in 0..self.indent_level {
            self.buffer.push_str("    ");
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write `header {`, the body at one more level of indentation, then `}`.
    pub fn block<F>(&mut self, header: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(&format!("{} {{", header));
        self.indent();
        f(self);
        self.dedent();
        self.line("}");
    }
}

/// Render `s` as a single-quoted PHP string literal.
///
/// Inside single quotes only `\` and `'` are special.
pub fn single_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Whether `s` is a valid PHP label (class, method or namespace segment name).
pub fn is_label(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

/// Whether `s` is a namespace-qualified name made of valid labels (`A\B\C`).
pub fn is_qualified_name(s: &str) -> bool {
    !s.is_empty() && s.split('\\').all(is_label)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indents_body() {
        let mut e = PhpEmitter::new();
        e.block("function f()", |e| {
            e.line("return 1;");
        });
        assert_eq!(e.finish(), "function f() {\n    return 1;\n}\n");
    }

    #[test]
    fn test_single_quoted_escapes() {
        assert_eq!(single_quoted("plain"), "'plain'");
        assert_eq!(single_quoted(r"A\B"), r"'A\\B'");
        assert_eq!(single_quoted("it's"), r"'it\'s'");
    }

    #[test]
    fn test_labels() {
        assert!(is_label("testAdd"));
        assert!(is_label("_x1"));
        assert!(is_label("ümlaut"));
        assert!(!is_label("1abc"));
        assert!(!is_label("a-b"));
        assert!(!is_label(""));
        assert!(is_qualified_name(r"App\Tests\FooTest"));
        assert!(!is_qualified_name(r"\App\FooTest"));
        assert!(!is_qualified_name(r"App\\FooTest"));
    }
}
