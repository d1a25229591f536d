//! Result aggregation.
//!
//! Folds captured driver output into an [`AggregateResult`]:
//! - test mode reads JSON marker lines from stdout (`TEST_PASS`, `TEST_FAIL`, and the assertion
//!   library's `ASSERT_OK` / `ASSERT_<KIND>_FAILED`);
//! - bench mode reads `key\ttrials\tavg ns/op` lines from stderr.
//!
//! Lines that are not markers are ignored: drivers share their streams with whatever the code under
//! test prints.

use std::time::Duration;

use serde_json::Value;

use super::config::RunMode;
use super::process::ExecutionResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailure {
    pub name: String,
    pub reason: String,
    pub message: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    pub key: String,
    pub trials: u64,
    pub avg_ns: f64,
}

/// Totals for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub mode: RunMode,
    pub tests: usize,
    pub assertions: usize,
    pub failures: Vec<TestFailure>,
    pub benchmarks: Vec<BenchmarkSample>,
    /// Files with at least one successful execution.
    pub files: usize,
    pub time: Duration,
}

impl AggregateResult {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            tests: 0,
            assertions: 0,
            failures: Vec::new(),
            benchmarks: Vec::new(),
            files: 0,
            time: Duration::ZERO,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Most recent failed assertion of the test currently running.
#[derive(Debug)]
struct PendingAssertion {
    kind: String,
    expected: String,
    actual: String,
    message: String,
    line: String,
}

pub struct Aggregator {
    result: AggregateResult,
}

impl Aggregator {
    pub fn new(mode: RunMode) -> Self {
        Self {
            result: AggregateResult::new(mode),
        }
    }

    /// Fold every run of one file.
    pub fn add_file(&mut self, short_name: &str, executions: &[ExecutionResult]) {
        if executions.iter().any(|e| e.outcome.success()) {
            self.result.files += 1;
        }
        for execution in executions {
            match self.result.mode {
                RunMode::Test => self.add_test_output(short_name, &execution.stdout),
                RunMode::Bench => self.add_bench_output(&execution.stderr),
            }
        }
    }

    /// Fold the stdout of one test driver run.
    pub fn add_test_output(&mut self, short_name: &str, stdout: &[u8]) {
        let text = String::from_utf8_lossy(stdout);
        let mut pending: Option<PendingAssertion> = None;

        for line in text.lines() {
            let Ok(Value::Array(fields)) = serde_json::from_str::<Value>(line.trim()) else {
                continue;
            };
            let Some(tag) = fields.first().and_then(Value::as_str) else {
                continue;
            };

            match tag {
                "ASSERT_OK" => self.result.assertions += 1,
                "TEST_PASS" => {
                    self.result.tests += 1;
                    pending = None;
                }
                "TEST_FAIL" => {
                    let Some(name) = fields.get(1).and_then(Value::as_str) else {
                        continue;
                    };
                    self.result.tests += 1;
                    let failure = match pending.take() {
                        Some(assertion) => TestFailure {
                            name: name.to_string(),
                            reason: assertion.kind,
                            message: assertion_message(&assertion.message, &assertion.expected, &assertion.actual),
                            location: format!("{}:{}", short_name, assertion.line),
                        },
                        None => TestFailure {
                            name: name.to_string(),
                            reason: text_field(&fields, 2),
                            message: text_field(&fields, 3),
                            location: text_field(&fields, 4),
                        },
                    };
                    self.result.failures.push(failure);
                }
                _ => {
                    if let Some(kind) = tag.strip_prefix("ASSERT_").and_then(|t| t.strip_suffix("_FAILED")) {
                        self.result.assertions += 1;
                        pending = Some(PendingAssertion {
                            kind: kind.to_string(),
                            expected: value_text(fields.get(1)),
                            actual: value_text(fields.get(2)),
                            message: text_field(&fields, 3),
                            line: text_field(&fields, 4),
                        });
                    }
                }
            }
        }
    }

    /// Fold the stderr of one benchmark driver run.
    pub fn add_bench_output(&mut self, stderr: &[u8]) {
        let text = String::from_utf8_lossy(stderr);
        self.result.benchmarks.extend(text.lines().filter_map(parse_bench_line));
    }

    /// Finish aggregation; `time` is the wall time of the whole run.
    pub fn finish(mut self, time: Duration) -> AggregateResult {
        self.result.time = time;
        self.result
    }
}

/// Parse `key\ttrials\tavg ns/op`.
pub fn parse_bench_line(line: &str) -> Option<BenchmarkSample> {
    let mut parts = line.trim_end().splitn(3, '\t');
    let key = parts.next()?.trim();
    let trials = parts.next()?.trim().parse().ok()?;
    let avg_ns = parts.next()?.trim().strip_suffix("ns/op")?.trim().parse().ok()?;
    if key.is_empty() {
        return None;
    }
    Some(BenchmarkSample {
        key: key.to_string(),
        trials,
        avg_ns,
    })
}

fn assertion_message(user_message: &str, expected: &str, actual: &str) -> String {
    let failed = format!("Failed asserting that {} matches expected {}.", actual, expected);
    if user_message.is_empty() {
        failed
    } else {
        format!("{}\n{}", user_message, failed)
    }
}

/// Field as display text: strings verbatim, other values as JSON, missing as empty.
fn text_field(fields: &[Value], index: usize) -> String {
    match fields.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Asserted values keep their JSON spelling so `"1"` and `1` stay distinguishable.
fn value_text(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_else(|| "null".to_string())
}
