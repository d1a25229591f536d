//! Text rendering of an [`AggregateResult`].

use std::fmt::Write;

use super::aggregate::AggregateResult;
use super::config::{FormatConfig, RunMode};

/// Render `result` as the final report.
///
/// Test mode:
/// ```text
/// Tests: 4, Assertions: 9, Failures: 1.
///
/// 1) FooTest::testC
/// RuntimeException
/// boom
/// tests/FooTest.php:12
///
/// Time: 0.42s
/// ```
///
/// Bench mode prints one `benchstat`-compatible `key\ttrials\tavg ns/op` line per sample.
pub fn format_report(result: &AggregateResult, config: &FormatConfig) -> String {
    let mut out = String::new();
    match result.mode {
        RunMode::Test => {
            let _ = writeln!(
                out,
                "Tests: {}, Assertions: {}, Failures: {}.",
                result.tests,
                result.assertions,
                result.failures.len()
            );
            for (i, failure) in result.failures.iter().enumerate() {
                let _ = writeln!(out);
                let _ = writeln!(out, "{}) {}", i + 1, failure.name);
                let _ = writeln!(out, "{}", failure.reason);
                let _ = writeln!(out, "{}", failure.message);
                let _ = writeln!(out, "{}", failure.location);
            }
        }
        RunMode::Bench => {
            for sample in &result.benchmarks {
                let _ = writeln!(out, "{}\t{}\t{:.1} ns/op", sample.key, sample.trials, sample.avg_ns);
            }
        }
    }

    if config.print_time {
        if !out.is_empty() {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "Time: {:.2}s", result.time.as_secs_f64());
    }
    out
}
