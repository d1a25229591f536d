//! CLI for the harness
//!
//! ## Commands
//!
//! - `test <path>` - Compile and run `*Test.php` files, print a pass/fail report
//! - `bench <path>` - Compile and run `*Bench.php` files, print `benchstat`-compatible lines
//! - `env` - Print toolchain-related environment variables
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::harness::RunMode;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test and benchmark runner for KPHP
#[derive(Parser, Debug)]
#[command(name = "kharness")]
#[command(version = VERSION)]
#[command(about = "Test and benchmark runner for KPHP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Whether the invoked command asked for debug output.
    pub fn debug(&self) -> bool {
        match &self.command {
            Command::Test(args) | Command::Bench(args) => args.debug,
            Command::Env => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test classes from *Test.php files
    Test(RunArgs),

    /// Run benchmark classes from *Bench.php files
    Bench(RunArgs),

    /// Print toolchain-related environment variables
    Env,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Test(_) => "test",
            Command::Bench(_) => "bench",
            Command::Env => "env",
        }
    }
}

/// Flags shared by `test` and `bench`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// File or directory to run
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// How many times to run each compiled driver
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Interpret drivers with this PHP command instead of compiling them
    #[arg(long = "php", value_name = "CMD")]
    pub php: Option<String>,

    /// kphp2cpp binary (default: $KPHP_ROOT/objs/bin/kphp2cpp)
    #[arg(long = "kphp", value_name = "PATH")]
    pub kphp: Option<PathBuf>,

    /// Project root, used for composer autoloading and short file names
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Keep the temporary build directory
    #[arg(long)]
    pub no_cleanup: bool,

    /// Print debug information
    #[arg(long)]
    pub debug: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run(cli: Cli) {
    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let name = cli.command.name();
    let result = match cli.command {
        Command::Test(args) => commands::run_harness(RunMode::Test, &args),
        Command::Bench(args) => commands::run_harness(RunMode::Bench, &args),
        Command::Env => commands::print_env(),
    };
    result.map_err(|e| CliError::new(format!("kharness {}: error: {}", name, e.message), e.exit_code))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_test_defaults() {
        let cli = Cli::try_parse_from(["kharness", "test", "tests/"]).unwrap();
        let Command::Test(args) = cli.command else {
            panic!("Expected Test command");
        };
        assert_eq!(args.path, PathBuf::from("tests/"));
        assert_eq!(args.count, 1);
        assert_eq!(args.project_root, PathBuf::from("."));
        assert!(args.php.is_none());
        assert!(!args.no_cleanup);
    }

    #[test]
    fn test_cli_parse_bench_flags() {
        let cli = Cli::try_parse_from([
            "kharness",
            "bench",
            "bench/",
            "--count",
            "5",
            "--php",
            "php -n",
            "--kphp",
            "/opt/kphp2cpp",
            "--no-cleanup",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug());
        let Command::Bench(args) = cli.command else {
            panic!("Expected Bench command");
        };
        assert_eq!(args.count, 5);
        assert_eq!(args.php.as_deref(), Some("php -n"));
        assert_eq!(args.kphp, Some(PathBuf::from("/opt/kphp2cpp")));
        assert!(args.no_cleanup);
    }

    #[test]
    fn test_cli_parse_rejects_zero_count() {
        assert!(Cli::try_parse_from(["kharness", "test", "x", "--count", "0"]).is_err());
    }

    #[test]
    fn test_cli_parse_requires_path() {
        assert!(Cli::try_parse_from(["kharness", "bench"]).is_err());
    }

    #[test]
    fn test_cli_parse_env() {
        let cli = Cli::try_parse_from(["kharness", "env"]).unwrap();
        assert!(matches!(cli.command, Command::Env));
        assert!(!cli.debug());
    }
}
