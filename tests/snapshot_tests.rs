//! Golden snapshot tests for generated drivers and reports
//!
//! Run with: `cargo test --test snapshot_tests`
//! Review changes: `cargo insta review`

use std::path::Path;
use std::time::Duration;

use kharness::harness::analyzer::{Method, ParsedInfo};
use kharness::harness::driver::{Calibration, DriverTemplate};
use kharness::harness::{AggregateResult, BenchmarkSample, FormatConfig, RunMode, TestFailure, format_report};

fn parsed(class_name: &str, methods: &[&str]) -> ParsedInfo {
    ParsedInfo {
        class_name: class_name.to_string(),
        methods: methods
            .iter()
            .map(|name| Method {
                name: name.to_string(),
                key: name.to_string(),
            })
            .collect(),
    }
}

#[test]
fn test_test_driver_snapshot() {
    let artifact = DriverTemplate::new(RunMode::Test)
        .render(
            &parsed("App\\FooTest", &["testAdd", "testSub"]),
            Path::new("/project/tests/FooTest.php"),
            Some(Path::new("/project/vendor/autoload.php")),
        )
        .unwrap();
    insta::assert_snapshot!("test_driver", artifact.script);
}

#[test]
fn test_bench_driver_snapshot() {
    let calibration = Calibration {
        unroll: 2,
        ..Calibration::default()
    };
    let artifact = DriverTemplate::new(RunMode::Bench)
        .with_calibration(calibration)
        .render(&parsed("MathBench", &["benchAdd"]), Path::new("/project/MathBench.php"), None)
        .unwrap();
    insta::assert_snapshot!("bench_driver", artifact.script);
}

#[test]
fn test_test_report_snapshot() {
    let mut result = AggregateResult::new(RunMode::Test);
    result.tests = 4;
    result.assertions = 9;
    result.failures.push(TestFailure {
        name: "FooTest::testC".to_string(),
        reason: "SAME".to_string(),
        message: "sums differ\nFailed asserting that 3 matches expected 2.".to_string(),
        location: "tests/FooTest.php:12".to_string(),
    });
    result.failures.push(TestFailure {
        name: "FooTest::testD".to_string(),
        reason: "RuntimeException".to_string(),
        message: "boom".to_string(),
        location: "/project/tests/FooTest.php:30".to_string(),
    });
    result.time = Duration::from_millis(420);
    insta::assert_snapshot!("test_report", format_report(&result, &FormatConfig::default()));
}

#[test]
fn test_bench_report_snapshot() {
    let mut result = AggregateResult::new(RunMode::Bench);
    for (key, trials, avg_ns) in [("benchAdd", 1000, 42.0), ("sort/1000 ints", 40, 125_000.5)] {
        result.benchmarks.push(BenchmarkSample {
            key: key.to_string(),
            trials,
            avg_ns,
        });
    }
    insta::assert_snapshot!("bench_report", format_report(&result, &FormatConfig::new().with_print_time(false)));
}
