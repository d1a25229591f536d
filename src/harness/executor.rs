//! Build and execute drivers.
//!
//! Two paths, picked by the run configuration:
//! - interpret: `<php> -f <build>/main.php`, run N times;
//! - compile: `<kphp2cpp> --mode cli --destination-directory <build> [--composer-root <root>]
//!   <build>/main.php`, then `<build>/cli` run N times.
//!
//! Every invocation runs inside the build directory. Stderr is tee'd to the live sink while it is
//! captured; compiler output is only captured, and logged if compilation fails.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use super::build_dir::BuildDirectory;
use super::config::RunConfig;
use super::driver::DriverArtifact;
use super::error::{FileError, HarnessError};
use super::process::{ExecutionResult, Invocation, ProcessRunner, run_captured};

/// Failure while executing one file: fatal to the run, or scoped to the file.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Fatal(#[from] HarnessError),

    #[error(transparent)]
    File(#[from] FileError),
}

pub struct Executor<'a> {
    config: &'a RunConfig,
    runner: &'a dyn ProcessRunner,
    build: &'a BuildDirectory,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a RunConfig, runner: &'a dyn ProcessRunner, build: &'a BuildDirectory) -> Self {
        Self { config, runner, build }
    }

    /// Write, build and run one driver `run_count` times.
    ///
    /// Runs that exit non-zero are logged and still returned: a failing test process may have
    /// reported results before it died. A run that cannot be started is logged and skipped; the
    /// file only fails with [`FileError::Spawn`] when no run started at all.
    pub fn run_file(
        &self,
        short_name: &str,
        artifact: &DriverArtifact,
        live_stderr: &mut dyn Write,
    ) -> Result<Vec<ExecutionResult>, ExecuteError> {
        let script = self
            .build
            .write_driver(artifact)
            .map_err(|source| HarnessError::WriteDriver {
                path: self.build.path().join(artifact.filename),
                source,
            })?;

        let invocation = match &self.config.interpreter {
            Some(command) => self.interpret_invocation(command, &script),
            None => {
                self.compile(short_name, &script)?;
                Invocation::new(self.build.binary(), self.build.path())
            }
        };

        let mut results = Vec::with_capacity(self.config.run_count);
        let mut spawn_error = None;
        for run in 1..=self.config.run_count {
            debug!(file = short_name, run, "executing driver");
            match run_captured(self.runner, &invocation, live_stderr) {
                Ok(result) => {
                    if !result.outcome.success() {
                        warn!(file = short_name, run, status = %result.outcome, "driver exited unsuccessfully");
                    }
                    results.push(result);
                }
                Err(source) => {
                    warn!(file = short_name, run, error = %source, "cannot start {}, skipping run", invocation.program_name());
                    spawn_error = Some(source);
                }
            }
        }

        match spawn_error {
            Some(source) if results.is_empty() => Err(FileError::Spawn {
                program: invocation.program_name(),
                source,
            }
            .into()),
            _ => Ok(results),
        }
    }

    /// `php -f main.php`; extra words in the interpreter command become leading arguments.
    fn interpret_invocation(&self, command: &str, script: &Path) -> Invocation {
        let mut words = command.split_whitespace();
        let program = words.next().unwrap_or("php");
        let mut invocation = Invocation::new(program, self.build.path());
        for word in words {
            invocation = invocation.arg(word);
        }
        invocation.arg("-f").arg(script)
    }

    fn compile_invocation(&self, script: &Path) -> Invocation {
        let mut invocation = Invocation::new(self.config.compiler.as_os_str(), self.build.path())
            .arg("--mode")
            .arg("cli")
            .arg("--destination-directory")
            .arg(self.build.path());
        if let Some(root) = self.config.composer_root() {
            invocation = invocation.arg("--composer-root").arg(root);
        }
        invocation.arg(OsString::from(script))
    }

    fn compile(&self, short_name: &str, script: &Path) -> Result<(), FileError> {
        // A binary left over from the previous file must never be run for this one.
        let binary = self.build.binary();
        match std::fs::remove_file(&binary) {
            Ok(()) => debug!(path = %binary.display(), "removed previous binary"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(FileError::StaleBinary { path: binary, source }),
        }

        let invocation = self.compile_invocation(script);
        debug!(file = short_name, compiler = %invocation.program_name(), "compiling driver");
        let result = run_captured(self.runner, &invocation, &mut io::sink()).map_err(|source| FileError::Spawn {
            program: invocation.program_name(),
            source,
        })?;

        if !result.outcome.success() {
            warn!(
                file = short_name,
                status = %result.outcome,
                "compilation failed:\n{}{}",
                String::from_utf8_lossy(&result.stdout),
                String::from_utf8_lossy(&result.stderr)
            );
            return Err(FileError::Compile {
                status: result.outcome.to_string(),
            });
        }
        Ok(())
    }
}
