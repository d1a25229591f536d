//! Test and benchmark harness for KPHP-compatible PHP sources.
//!
//! ## Pipeline
//!
//! 1. **Discovery** (`discovery`): walk the target for `*Test.php` / `*Bench.php`.
//! 2. **Analysis** (`analyzer`): parse each file and pick the harness class and its methods.
//! 3. **Generation** (`driver`): render a `main.php` driver around the class.
//! 4. **Execution** (`executor`): compile with `kphp2cpp` or interpret with `php`, run N times.
//! 5. **Aggregation** (`aggregate`) and **reporting** (`report`).
//!
//! [`runner::run`] strings the stages together. Child processes go through the [`ProcessRunner`]
//! trait so the whole pipeline can be driven without a toolchain installed.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod aggregate;
pub mod analyzer;
pub mod build_dir;
pub mod config;
pub mod discovery;
pub mod driver;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod process;
pub mod report;
pub mod runner;

pub use aggregate::{AggregateResult, Aggregator, BenchmarkSample, TestFailure};
pub use config::{FormatConfig, RunConfig, RunMode};
pub use error::{FileError, HarnessError, PipelineError};
pub use process::{ExecutionResult, ExitOutcome, Invocation, ProcessRunner, SystemRunner};
pub use report::format_report;
pub use runner::{RunResult, run};
