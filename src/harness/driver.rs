//! Driver script generation.
//!
//! A driver is a standalone PHP script that loads the file under test, instantiates its class and
//! calls every eligible method, reporting through the channel the aggregator reads:
//! - tests print one JSON marker per method on stdout,
//! - benchmarks print `key\ttrials\tavg ns/op` lines on stderr after self-calibrating.
//!
//! Test drivers also load the bundled assertion library (`assets/kphpunit.php`), which defines
//! `PHPUnit\Framework\TestCase` and prints the `ASSERT_*` markers. It is written next to the
//! driver and required before the file under test.
//!
//! The template is a plain value ([`DriverTemplate`]) built once per run and handed to the
//! generation stage.

use std::path::Path;

use serde_json::json;

use super::analyzer::{Method, ParsedInfo};
use super::config::RunMode;
use super::emitter::{PhpEmitter, is_label, is_qualified_name, single_quoted};
use super::error::GenerationError;

/// Name of the generated script inside the build directory.
pub const DRIVER_FILENAME: &str = "main.php";

/// Name of the assertion library inside the build directory.
pub const ASSERTION_LIBRARY_FILENAME: &str = "kphpunit.php";

/// Files test drivers require from the build directory.
pub const TEST_SUPPORT_FILES: &[SupportFile] = &[SupportFile {
    filename: ASSERTION_LIBRARY_FILENAME,
    contents: include_str!("../../assets/kphpunit.php"),
}];

/// Benchmark calibration constants.
///
/// A single calibration call measures `baseline` nanoseconds; the method is then run
/// `max(min_trials, target_ns / baseline)` times in batches of `unroll` calls per timing sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub min_trials: u64,
    pub target_ns: u64,
    pub unroll: usize,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            min_trials: 40,
            target_ns: 1_000_000_000,
            unroll: 20,
        }
    }
}

impl Calibration {
    /// Number of trials the driver runs for a calibration call that took `baseline_ns`.
    ///
    /// A zero baseline is treated as 1ns.
    pub fn trials_for(&self, baseline_ns: u64) -> u64 {
        (self.target_ns / baseline_ns.max(1)).max(self.min_trials)
    }
}

/// A static PHP file written into the build directory alongside the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportFile {
    pub filename: &'static str,
    pub contents: &'static str,
}

/// A generated driver, ready to be written into the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverArtifact {
    pub filename: &'static str,
    pub script: String,
    /// Files the script requires by path relative to itself.
    pub support: &'static [SupportFile],
}

/// Driver template for one run mode.
#[derive(Debug, Clone)]
pub struct DriverTemplate {
    mode: RunMode,
    calibration: Calibration,
}

impl DriverTemplate {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            calibration: Calibration::default(),
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Render the driver for `info`, loaded from `source` after the optional `bootstrap`.
    ///
    /// Test drivers require the assertion library between the bootstrap and the source.
    pub fn render(
        &self,
        info: &ParsedInfo,
        source: &Path,
        bootstrap: Option<&Path>,
    ) -> Result<DriverArtifact, GenerationError> {
        if !is_qualified_name(&info.class_name) {
            return Err(GenerationError::InvalidClassName(info.class_name.clone()));
        }
        if let Some(bad) = info.methods.iter().find(|m| !is_label(&m.name)) {
            return Err(GenerationError::InvalidMethodName(bad.name.clone()));
        }

        let mut e = PhpEmitter::new();
        e.line("<?php");
        e.blank_line();
        if let Some(bootstrap) = bootstrap {
            e.line(&format!("require_once {};", single_quoted(&bootstrap.to_string_lossy())));
        }
        let support = self.support_files();
        for file in support {
            e.line(&format!("require_once __DIR__ . {};", single_quoted(&format!("/{}", file.filename))));
        }
        e.line(&format!("require_once {};", single_quoted(&source.to_string_lossy())));
        e.blank_line();

        let class = format!("\\{}", info.class_name);
        e.block("function __harness_main()", |e| {
            for (i, method) in info.methods.iter().enumerate() {
                if i > 0 {
                    e.blank_line();
                }
                match self.mode {
                    RunMode::Test => self.test_block(e, &class, &info.class_name, method),
                    RunMode::Bench => self.bench_block(e, &class, method),
                }
            }
        });
        e.blank_line();
        e.line("__harness_main();");

        Ok(DriverArtifact {
            filename: DRIVER_FILENAME,
            script: e.finish(),
            support,
        })
    }

    fn support_files(&self) -> &'static [SupportFile] {
        match self.mode {
            RunMode::Test => TEST_SUPPORT_FILES,
            RunMode::Bench => &[],
        }
    }

    /// Fresh instance, call in `try`, one marker line either way.
    fn test_block(&self, e: &mut PhpEmitter, class: &str, class_name: &str, method: &Method) {
        let name = format!("{}::{}", class_name, method.key);
        let pass_marker = json!(["TEST_PASS", name]).to_string();

        e.line("try {");
        e.indent();
        e.line(&format!("$test = new {}();", class));
        e.line(&format!("$test->{}();", method.name));
        e.line(&format!("echo {}, \"\\n\";", single_quoted(&pass_marker)));
        e.dedent();
        e.line("} catch (\\Throwable $e) {");
        e.indent();
        e.line(&format!(
            "echo json_encode([\"TEST_FAIL\", {}, get_class($e), $e->getMessage(), $e->getFile() . ':' . $e->getLine()]), \"\\n\";",
            single_quoted(&name)
        ));
        e.dedent();
        e.line("}");
    }

    /// Calibrate with one call, then time batches of unrolled calls.
    fn bench_block(&self, e: &mut PhpEmitter, class: &str, method: &Method) {
        let Calibration {
            min_trials,
            target_ns,
            unroll,
        } = self.calibration;
        let call = format!("$bench->{}();", method.name);

        e.line(&format!("$bench = new {}();", class));
        e.line(&format!("fprintf(STDERR, \"%s\\t\", {});", single_quoted(&method.key)));
        e.line("$run1_start = hrtime(true);");
        e.line(&call);
        e.line("$run1_end = hrtime(true);");
        e.line("$op_time_approx = $run1_end - $run1_start;");
        e.block("if ($op_time_approx < 1)", |e| e.line("$op_time_approx = 1;"));
        e.line(&format!("$num_tries = (int)({} / $op_time_approx);", target_ns));
        e.block(&format!("if ($num_tries < {})", min_trials), |e| {
            e.line(&format!("$num_tries = {};", min_trials));
        });
        e.line("$time_total = 0;");
        e.block(&format!("for ($i = 0; $i < $num_tries; $i += {})", unroll), |e| {
            e.line("$start = hrtime(true);");
            for _ in 0..unroll {
                e.line(&call);
            }
            e.line("$elapsed = hrtime(true) - $start;");
            e.block("if ($elapsed > 0)", |e| e.line("$time_total += $elapsed;"));
        });
        e.line("$avg_time = (int)($time_total / $num_tries);");
        e.line("fprintf(STDERR, \"$num_tries\\t$avg_time.0 ns/op\\n\");");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(class_name: &str, methods: &[(&str, &str)]) -> ParsedInfo {
        ParsedInfo {
            class_name: class_name.to_string(),
            methods: methods
                .iter()
                .map(|(name, key)| Method {
                    name: name.to_string(),
                    key: key.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_trials_floor() {
        let c = Calibration::default();
        assert_eq!(c.trials_for(0), 1_000_000_000);
        assert_eq!(c.trials_for(1_000_000_000), 40);
        assert_eq!(c.trials_for(10_000_000), 100);
        assert_eq!(c.trials_for(u64::MAX), 40);
    }

    #[test]
    fn test_one_block_per_method_in_order() {
        let template = DriverTemplate::new(RunMode::Test);
        let artifact = template
            .render(&info("App\\FooTest", &[("testB", "testB"), ("testA", "testA")]), Path::new("/src/FooTest.php"), None)
            .unwrap();
        let b = artifact.script.find("$test->testB();").unwrap();
        let a = artifact.script.find("$test->testA();").unwrap();
        assert!(b < a);
        assert_eq!(artifact.script.matches("catch (\\Throwable $e)").count(), 2);
        assert_eq!(artifact.filename, "main.php");
    }

    #[test]
    fn test_bench_block_unrolls_calls() {
        let template = DriverTemplate::new(RunMode::Bench);
        let artifact = template
            .render(&info("ArrayBench", &[("benchPush", "push")]), Path::new("/src/ArrayBench.php"), None)
            .unwrap();
        // One calibration call plus the unrolled batch.
        assert_eq!(artifact.script.matches("$bench->benchPush();").count(), 21);
        assert!(artifact.script.contains("fprintf(STDERR, \"%s\\t\", 'push');"));
        assert!(artifact.script.contains("if ($num_tries < 40) {"));
    }

    #[test]
    fn test_bootstrap_required_before_source() {
        let template = DriverTemplate::new(RunMode::Test);
        let artifact = template
            .render(
                &info("FooTest", &[]),
                Path::new("/p/tests/FooTest.php"),
                Some(Path::new("/p/vendor/autoload.php")),
            )
            .unwrap();
        let boot = artifact.script.find("vendor/autoload.php").unwrap();
        let src = artifact.script.find("tests/FooTest.php").unwrap();
        assert!(boot < src);
    }

    #[test]
    fn test_assertion_library_required_in_test_mode_only() {
        let artifact = DriverTemplate::new(RunMode::Test)
            .render(
                &info("FooTest", &[("testA", "testA")]),
                Path::new("/p/tests/FooTest.php"),
                Some(Path::new("/p/vendor/autoload.php")),
            )
            .unwrap();
        assert_eq!(artifact.support, TEST_SUPPORT_FILES);
        let boot = artifact.script.find("vendor/autoload.php").unwrap();
        let lib = artifact.script.find("require_once __DIR__ . '/kphpunit.php';").unwrap();
        let src = artifact.script.find("tests/FooTest.php").unwrap();
        assert!(boot < lib && lib < src);

        let artifact = DriverTemplate::new(RunMode::Bench)
            .render(&info("FooBench", &[("benchA", "benchA")]), Path::new("/p/FooBench.php"), None)
            .unwrap();
        assert!(artifact.support.is_empty());
        assert!(!artifact.script.contains("kphpunit.php"));
    }

    #[test]
    fn test_assertion_library_emits_markers() {
        let library = TEST_SUPPORT_FILES[0].contents;
        assert!(library.starts_with("<?php"));
        assert!(library.contains("namespace PHPUnit\\Framework;"));
        assert!(library.contains("class TestCase"));
        assert!(library.contains("json_encode(['ASSERT_OK'])"));
        assert!(library.contains("\"ASSERT_{$kind}_FAILED\", $expected, $actual, $message, $line"));
        for method in ["assertTrue", "assertFalse", "assertSame", "assertEquals"] {
            assert!(library.contains(&format!("function {}(", method)), "{}", method);
            assert!(library.contains(&format!("function {}WithLine(int $line", method)), "{}", method);
        }
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let template = DriverTemplate::new(RunMode::Test);
        let err = template.render(&info("Foo-Test", &[]), Path::new("/x.php"), None).unwrap_err();
        assert_eq!(err, GenerationError::InvalidClassName("Foo-Test".to_string()));

        let err = template
            .render(&info("FooTest", &[("test;drop", "k")]), Path::new("/x.php"), None)
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidMethodName(_)));
    }

    #[test]
    fn test_pass_marker_is_escaped_json() {
        let template = DriverTemplate::new(RunMode::Test);
        let artifact = template
            .render(&info("App\\FooTest", &[("testA", "it's")]), Path::new("/x.php"), None)
            .unwrap();
        // JSON escapes the backslash, PHP single quotes escape both again.
        assert!(artifact.script.contains(r#"echo '["TEST_PASS","App\\\\FooTest::it\'s"]', "\n";"#));
    }
}
