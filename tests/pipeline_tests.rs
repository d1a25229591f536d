//! End-to-end pipeline tests
//!
//! Child processes are replaced by scripted `ProcessRunner`s, so these run without a PHP or KPHP
//! installation. Fixture trees are built in temp directories.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use kharness::harness::discovery::discover;
use kharness::harness::{ExitOutcome, FormatConfig, Invocation, ProcessRunner, RunConfig, RunMode, format_report, run};

/// Plays the toolchain: records every invocation and answers with canned output.
#[derive(Default)]
struct ScriptedRunner {
    stdout: String,
    stderr: String,
    compiler_fails: bool,
    /// After the first driver run, put a directory where the driver goes so the next write fails.
    obstruct_driver: bool,
    calls: RefCell<Vec<Invocation>>,
    /// Driver scripts as they were on disk when the interpreter ran.
    scripts: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    fn compiler_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|c| is_compiler(c)).count()
    }
}

fn is_compiler(invocation: &Invocation) -> bool {
    invocation.args.iter().any(|a| a == "--destination-directory")
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<ExitOutcome> {
        self.calls.borrow_mut().push(invocation.clone());
        if is_compiler(invocation) {
            if self.compiler_fails {
                stderr.write_all(b"Compilation error at stage: Parse file\n")?;
                return Ok(ExitOutcome { code: Some(1) });
            }
            return Ok(ExitOutcome::SUCCESS);
        }
        if let Some(script) = invocation.args.last() {
            if let Ok(text) = fs::read_to_string(script) {
                self.scripts.borrow_mut().push(text);
            }
            if self.obstruct_driver {
                fs::remove_file(script)?;
                fs::create_dir(script)?;
                fs::write(Path::new(script).join("blocker"), "")?;
            }
        }
        stdout.write_all(self.stdout.as_bytes())?;
        stderr.write_all(self.stderr.as_bytes())?;
        Ok(ExitOutcome::SUCCESS)
    }
}

fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, source) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
}

fn interpreted(mode: RunMode, dir: &Path) -> RunConfig {
    RunConfig::new(mode, dir)
        .with_project_root(dir)
        .with_interpreter(Some("php".to_string()))
}

// ============================================================================
// Benchmarks
// ============================================================================

#[test]
fn test_bench_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[(
            "MathBench.php",
            "<?php\nclass MathBench {\n    public function benchAdd() {\n        $x = 1 + 2;\n    }\n}\n",
        )],
    );
    let runner = ScriptedRunner {
        stderr: "benchAdd\t1000\t42.0 ns/op\n".to_string(),
        ..ScriptedRunner::default()
    };
    let mut live = Vec::new();

    let result = run(&interpreted(RunMode::Bench, dir.path()), &runner, &mut live).unwrap();

    assert_eq!(String::from_utf8(live).unwrap(), "benchAdd\t1000\t42.0 ns/op\n");
    let report = format_report(&result.aggregate, &FormatConfig::new().with_print_time(false));
    assert!(report.contains("benchAdd"));
    assert!(report.contains("42.0 ns/op"));
    assert_eq!(result.aggregate.files, 1);

    let scripts = runner.scripts.borrow();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].contains("$bench = new \\MathBench();"));
    assert!(scripts[0].contains("$bench->benchAdd();"));
}

#[test]
fn test_bench_run_count() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &[("ABench.php", "<?php class ABench { public function benchA() {} }")]);
    let runner = ScriptedRunner {
        stderr: "benchA\t40\t10.0 ns/op\n".to_string(),
        ..ScriptedRunner::default()
    };

    let config = interpreted(RunMode::Bench, dir.path()).with_run_count(3);
    let result = run(&config, &runner, &mut io::sink()).unwrap();
    assert_eq!(result.aggregate.benchmarks.len(), 3);
    assert_eq!(runner.calls.borrow().len(), 3);
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_invalid_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("FooTest.php", "<?php\nclass FooTest {\n    public function testA() {}\n}\n"),
            ("BrokenTest.php", "<?php\nclass BrokenTest {\n    public function testA( }\n"),
        ],
    );
    let runner = ScriptedRunner {
        stdout: "[\"TEST_PASS\",\"FooTest::testA\"]\n".to_string(),
        ..ScriptedRunner::default()
    };

    let result = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap();

    assert_eq!(runner.calls.borrow().len(), 1);
    assert!(runner.scripts.borrow()[0].contains("FooTest.php"));
    assert_eq!(result.aggregate.files, 1);
    assert_eq!(result.aggregate.tests, 1);
    assert!(!result.aggregate.has_failures());
}

#[test]
fn test_multibyte_text_after_close_tag() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("ATest.php", "<?php class ATest { public function testA() {} }"),
            ("BTest.php", "<?php class BTest { public function testB() {} } ?>\n<?ééà\n"),
        ],
    );
    let runner = ScriptedRunner::default();

    let result = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap();

    let scripts = runner.scripts.borrow();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[1].contains("new \\BTest()"));
    assert_eq!(result.aggregate.files, 2);
}

#[test]
fn test_test_drivers_load_assertion_library() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[(
            "MathTest.php",
            "<?php\nuse PHPUnit\\Framework\\TestCase;\nclass MathTest extends TestCase {\n    public function testAdd() {\n        $this->assertSame(2, 1 + 1);\n    }\n}\n",
        )],
    );
    let runner = ScriptedRunner::default();

    let config = interpreted(RunMode::Test, dir.path()).with_keep_build_dir(true);
    let result = run(&config, &runner, &mut io::sink()).unwrap();

    let kept = result.kept_build_dir.unwrap();
    let library = fs::read_to_string(kept.join("kphpunit.php")).unwrap();
    assert!(library.contains("namespace PHPUnit\\Framework;"));
    assert!(library.contains("class TestCase"));
    let script = &runner.scripts.borrow()[0];
    let lib = script.find("require_once __DIR__ . '/kphpunit.php';").unwrap();
    let src = script.find("MathTest.php").unwrap();
    assert!(lib < src);
    fs::remove_dir_all(kept).unwrap();
}

#[test]
fn test_bench_drivers_have_no_assertion_library() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &[("BenchmarkSort.php", "<?php class BenchmarkSort { public function benchA() {} }")]);
    let runner = ScriptedRunner::default();

    let config = interpreted(RunMode::Bench, dir.path()).with_keep_build_dir(true);
    let result = run(&config, &runner, &mut io::sink()).unwrap();

    let kept = result.kept_build_dir.unwrap();
    assert!(!kept.join("kphpunit.php").exists());
    assert!(runner.scripts.borrow()[0].contains("new \\BenchmarkSort()"));
    fs::remove_dir_all(kept).unwrap();
}

#[test]
fn test_classless_files_are_not_run() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("a/OneTest.php", "<?php class OneTest { public function testA() {} }"),
            ("b/HelpersTest.php", "<?php function helper() { return 1; }"),
            ("c/TwoTest.php", "<?php namespace App; class TwoTest { public function testB() {} }"),
        ],
    );
    let runner = ScriptedRunner::default();

    let result = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap();

    let scripts = runner.scripts.borrow();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].contains("new \\OneTest()"));
    assert!(scripts[1].contains("new \\App\\TwoTest()"));
    assert_eq!(result.aggregate.files, 2);
}

#[test]
fn test_failures_from_driver_output() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &[("tests/FooTest.php", "<?php class FooTest { public function testA() {} }")]);
    let runner = ScriptedRunner {
        stdout: concat!(
            "[\"ASSERT_OK\"]\n",
            "[\"ASSERT_SAME_FAILED\",1,2,\"\",5]\n",
            "[\"TEST_FAIL\",\"FooTest::testA\",\"AssertionFailure\",\"x\",\"/tmp/main.php:9\"]\n",
        )
        .to_string(),
        ..ScriptedRunner::default()
    };

    let result = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap();

    let failure = &result.aggregate.failures[0];
    assert_eq!(failure.name, "FooTest::testA");
    assert_eq!(failure.reason, "SAME");
    assert_eq!(failure.location, format!("tests{}FooTest.php:5", std::path::MAIN_SEPARATOR));
    assert_eq!(result.aggregate.assertions, 2);
}

#[test]
fn test_empty_target_reports_zero_tests() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default();
    let result = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap();
    assert_eq!(result.aggregate.tests, 0);
    let report = format_report(&result.aggregate, &FormatConfig::new().with_print_time(false));
    assert_eq!(report, "Tests: 0, Assertions: 0, Failures: 0.\n");
}

// ============================================================================
// Build directory and errors
// ============================================================================

fn build_dirs(runner: &ScriptedRunner) -> Vec<PathBuf> {
    runner.calls.borrow().iter().map(|c| c.workdir.clone()).collect()
}

#[test]
fn test_build_dir_removed_after_compile_failures() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("ATest.php", "<?php class ATest { public function testA() {} }"),
            ("BTest.php", "<?php class BTest { public function testB() {} }"),
        ],
    );
    let runner = ScriptedRunner {
        compiler_fails: true,
        ..ScriptedRunner::default()
    };

    let config = RunConfig::new(RunMode::Test, dir.path()).with_compiler("/opt/kphp/objs/bin/kphp2cpp");
    let result = run(&config, &runner, &mut io::sink()).unwrap();

    assert_eq!(runner.compiler_calls(), 2);
    assert_eq!(result.aggregate.files, 0);
    assert!(result.kept_build_dir.is_none());
    let dirs = build_dirs(&runner);
    assert!(dirs.iter().all(|d| d == &dirs[0]));
    assert!(!dirs[0].exists());
}

#[test]
fn test_build_dir_kept_on_request() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &[("ATest.php", "<?php class ATest { public function testA() {} }")]);
    let runner = ScriptedRunner::default();

    let config = interpreted(RunMode::Test, dir.path()).with_keep_build_dir(true);
    let result = run(&config, &runner, &mut io::sink()).unwrap();

    let kept = result.kept_build_dir.unwrap();
    assert!(kept.join("main.php").is_file());
    fs::remove_dir_all(kept).unwrap();
}

#[test]
fn test_build_dir_removed_after_fatal_run_error() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("ATest.php", "<?php class ATest { public function testA() {} }"),
            ("BTest.php", "<?php class BTest { public function testB() {} }"),
        ],
    );
    let runner = ScriptedRunner {
        obstruct_driver: true,
        ..ScriptedRunner::default()
    };

    let err = run(&interpreted(RunMode::Test, dir.path()), &runner, &mut io::sink()).unwrap_err();

    assert_eq!(err.stage, "run");
    assert!(err.to_string().starts_with("run: cannot write driver "));
    let dirs = build_dirs(&runner);
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
}

#[test]
fn test_missing_target_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default();
    let config = interpreted(RunMode::Test, &dir.path().join("nope"));

    let err = run(&config, &runner, &mut io::sink()).unwrap_err();
    assert_eq!(err.stage, "find files");
    assert!(err.to_string().starts_with("find files: "));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_discovery_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("z/ZTest.php", "<?php"),
            ("a/ATest.php", "<?php"),
            ("m/MTest.php", "<?php"),
            ("m/Helper.php", "<?php"),
            ("vendor/lib/LibTest.php", "<?php"),
        ],
    );
    let first = discover(dir.path(), RunMode::Test).unwrap();
    let second = discover(dir.path(), RunMode::Test).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
}
