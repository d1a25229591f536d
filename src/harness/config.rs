//! Run and report configuration.
//!
//! Plain structs with `Default`-style constructors and `with_*` builders; the CLI fills them from
//! flags and the environment, tests build them directly.

use std::path::{Path, PathBuf};

/// Compiler binary used when no toolchain root is configured.
pub const DEFAULT_COMPILER: &str = "kphp2cpp";

/// What kind of harness run this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Test,
    Bench,
}

impl RunMode {
    /// Whether a file name marks a candidate file for this mode.
    ///
    /// Mirrors the class conventions: `*Test.php` for tests, `*Bench.php` or `Benchmark*.php`
    /// for benchmarks.
    pub fn matches_file_name(self, name: &str) -> bool {
        match self {
            RunMode::Test => name.ends_with("Test.php"),
            RunMode::Bench => {
                name.ends_with("Bench.php") || (name.starts_with("Benchmark") && name.ends_with(".php"))
            }
        }
    }

    /// Lowercase name, as used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Test => "test",
            RunMode::Bench => "bench",
        }
    }
}

/// Configuration for a single harness run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    /// File or directory to discover candidate files in.
    pub target: PathBuf,
    /// Root for `short_name`s, composer bootstrap lookup and `--composer-root`.
    pub project_root: PathBuf,
    /// How many times each built driver is executed. Always at least 1.
    pub run_count: usize,
    /// Interpreter command; when set, drivers are interpreted instead of compiled.
    pub interpreter: Option<String>,
    /// Ahead-of-time compiler binary.
    pub compiler: PathBuf,
    /// Keep the build directory after the run instead of deleting it.
    pub keep_build_dir: bool,
}

impl RunConfig {
    /// Create a config for `target` with the project root set to the current directory.
    pub fn new(mode: RunMode, target: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            target: target.into(),
            project_root: PathBuf::from("."),
            run_count: 1,
            interpreter: None,
            compiler: PathBuf::from(DEFAULT_COMPILER),
            keep_build_dir: false,
        }
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Set the number of executions per driver (clamped to at least 1).
    pub fn with_run_count(mut self, count: usize) -> Self {
        self.run_count = count.max(1);
        self
    }

    pub fn with_interpreter(mut self, command: Option<String>) -> Self {
        self.interpreter = command;
        self
    }

    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_keep_build_dir(mut self, keep: bool) -> Self {
        self.keep_build_dir = keep;
        self
    }

    /// The project root when it is a composer project.
    pub fn composer_root(&self) -> Option<&Path> {
        self.project_root
            .join("composer.json")
            .is_file()
            .then_some(self.project_root.as_path())
    }

    /// Composer's autoloader, required by drivers before the source file.
    pub fn bootstrap(&self) -> Option<PathBuf> {
        self.composer_root().map(|root| root.join("vendor").join("autoload.php"))
    }
}

/// Report formatting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Append a `Time: X.XXs` line.
    pub print_time: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { print_time: true }
    }
}

impl FormatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_print_time(mut self, print_time: bool) -> Self {
        self.print_time = print_time;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_run_count_is_clamped() {
        let config = RunConfig::new(RunMode::Test, "tests").with_run_count(0);
        assert_eq!(config.run_count, 1);
    }

    #[test]
    fn test_bootstrap_requires_composer_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(RunMode::Bench, dir.path()).with_project_root(dir.path());
        assert!(config.bootstrap().is_none());

        std::fs::write(dir.path().join("composer.json"), "{}").unwrap();
        assert_eq!(config.bootstrap(), Some(dir.path().join("vendor").join("autoload.php")));
        assert_eq!(config.composer_root(), Some(dir.path()));
    }

    #[test]
    fn test_mode_file_names() {
        assert!(RunMode::Test.matches_file_name("FooTest.php"));
        assert!(!RunMode::Test.matches_file_name("TestFoo.php"));
        assert!(RunMode::Bench.matches_file_name("ArrayBench.php"));
        assert!(RunMode::Bench.matches_file_name("BenchmarkStrings.php"));
        assert!(!RunMode::Bench.matches_file_name("BenchmarkStrings.txt"));
        assert!(!RunMode::Bench.matches_file_name("FooTest.php"));
    }

    #[test]
    fn test_default_format_config_prints_time() {
        assert!(FormatConfig::default().print_time);
        assert!(!FormatConfig::new().with_print_time(false).print_time);
    }
}
