//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io::{self, Write};

use crate::harness::config::DEFAULT_COMPILER;
use crate::harness::{FormatConfig, RunConfig, RunMode, SystemRunner, format_report};
use crate::toolchain;

use super::{CliError, CliResult, ExitCode, RunArgs};

/// Translate command-line flags into a [`RunConfig`].
///
/// The toolchain root is only consulted when drivers are compiled and no `--kphp` was given.
pub fn run_config(mode: RunMode, args: &RunArgs) -> CliResult<RunConfig> {
    let compiler = match (&args.kphp, &args.php) {
        (Some(kphp), _) => kphp.clone(),
        (None, Some(_)) => DEFAULT_COMPILER.into(),
        (None, None) => {
            let root = toolchain::find_root().map_err(|e| CliError::failure(e.to_string()))?;
            toolchain::compiler_binary(&root)
        }
    };

    Ok(RunConfig::new(mode, &args.path)
        .with_project_root(&args.project_root)
        .with_run_count(args.count as usize)
        .with_interpreter(args.php.clone())
        .with_compiler(compiler)
        .with_keep_build_dir(args.no_cleanup))
}

/// Run `test` or `bench` and print the report to stdout.
///
/// Driver stderr streams to our stderr while it runs. Test runs with failures exit with 1.
pub fn run_harness(mode: RunMode, args: &RunArgs) -> CliResult<ExitCode> {
    let config = run_config(mode, args)?;

    let result = {
        let mut live = io::stderr().lock();
        crate::harness::run(&config, &SystemRunner, &mut live).map_err(|e| CliError::failure(e.to_string()))?
    };

    let report = format_report(&result.aggregate, &FormatConfig::default());
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(report.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| CliError::failure(format!("write report: {}", e)))?;

    if result.aggregate.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print `NAME="value"` for every toolchain variable.
pub fn print_env() -> CliResult<ExitCode> {
    print!("{}", toolchain::describe_env());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            path: PathBuf::from("tests"),
            count: 3,
            php: None,
            kphp: Some(PathBuf::from("/opt/kphp/objs/bin/kphp2cpp")),
            project_root: PathBuf::from("/work"),
            no_cleanup: true,
            debug: false,
        }
    }

    #[test]
    fn test_run_config_from_flags() {
        let config = run_config(RunMode::Bench, &args()).unwrap();
        assert_eq!(config.mode, RunMode::Bench);
        assert_eq!(config.target, PathBuf::from("tests"));
        assert_eq!(config.run_count, 3);
        assert_eq!(config.compiler, PathBuf::from("/opt/kphp/objs/bin/kphp2cpp"));
        assert_eq!(config.project_root, PathBuf::from("/work"));
        assert!(config.keep_build_dir);
    }

    #[test]
    fn test_interpreter_skips_toolchain_lookup() {
        let args = RunArgs {
            php: Some("php".to_string()),
            kphp: None,
            ..args()
        };
        let config = run_config(RunMode::Test, &args).unwrap();
        assert_eq!(config.interpreter.as_deref(), Some("php"));
    }
}
