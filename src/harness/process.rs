//! Child process boundary.
//!
//! Everything the harness runs (compiler, interpreter, compiled binary) goes through
//! [`ProcessRunner`], so tests can substitute canned output for real processes.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// A program to run, with its arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub workdir: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: workdir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program name for log messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// How a process ended.
///
/// `code` is `None` when the process was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub const SUCCESS: ExitOutcome = ExitOutcome { code: Some(0) };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Captured output of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub outcome: ExitOutcome,
    pub elapsed: Duration,
}

/// Runs child processes.
pub trait ProcessRunner {
    /// Run `invocation` to completion, streaming its stdout and stderr into the given writers.
    ///
    /// An `Err` means the process could not be started or its pipes failed; a process that ran
    /// and exited non-zero is an `Ok` with a failing [`ExitOutcome`].
    fn run(&self, invocation: &Invocation, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<ExitOutcome>;
}

/// Runs real processes via `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<ExitOutcome> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let mut child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

        // Drain stdout on a helper thread while stderr is forwarded here, so neither pipe fills up.
        let (stdout_bytes, stderr_result) = std::thread::scope(|scope| {
            let reader = scope.spawn(move || {
                let mut buf = Vec::new();
                child_stdout.read_to_end(&mut buf).map(|_| buf)
            });
            let stderr_result = io::copy(&mut child_stderr, stderr);
            let stdout_bytes = reader
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdout reader panicked")));
            (stdout_bytes, stderr_result)
        });

        let status = child.wait()?;
        stderr_result?;
        stdout.write_all(&stdout_bytes?)?;

        Ok(ExitOutcome { code: status.code() })
    }
}

/// Writer that forwards to a live sink and keeps a copy.
pub struct Tee<'a> {
    live: &'a mut dyn Write,
    captured: Vec<u8>,
}

impl<'a> Tee<'a> {
    pub fn new(live: &'a mut dyn Write) -> Self {
        Self {
            live,
            captured: Vec::new(),
        }
    }

    pub fn into_captured(self) -> Vec<u8> {
        self.captured
    }
}

impl Write for Tee<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.captured.extend_from_slice(buf);
        // A broken live sink must not lose the captured copy.
        let _ = self.live.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.live.flush();
        Ok(())
    }
}

/// Run `invocation`, capturing both streams and tee-ing stderr into `live_stderr`.
pub fn run_captured(
    runner: &dyn ProcessRunner,
    invocation: &Invocation,
    live_stderr: &mut dyn Write,
) -> io::Result<ExecutionResult> {
    let start = Instant::now();
    let mut stdout = Vec::new();
    let mut tee = Tee::new(live_stderr);
    let outcome = runner.run(invocation, &mut stdout, &mut tee)?;
    Ok(ExecutionResult {
        stdout,
        stderr: tee.into_captured(),
        outcome,
        elapsed: start.elapsed(),
    })
}
