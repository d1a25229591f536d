//! Harness error types
//!
//! Two scopes of failure exist:
//! - [`PipelineError`]: aborts the whole run (discovery, build directory, driver write).
//! - [`FileError`]: drops a single file (read, parse, generation, compile, spawn); the run goes on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors while turning the target path into candidate files
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("target {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("target {} is neither a directory nor a .php file", path.display())]
    NotPhp { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors while rendering a driver script
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("'{0}' is not a valid PHP class name")]
    InvalidClassName(String),

    #[error("'{0}' is not a valid PHP method name")]
    InvalidMethodName(String),
}

/// Errors scoped to one file; the file is skipped and the run continues
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot read source: {0}")]
    Read(#[source] io::Error),

    #[error("{count} syntax error(s), first at {line}:{column}: {message}")]
    Parse {
        count: usize,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("driver generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("compilation failed ({status})")]
    Compile { status: String },

    #[error("cannot remove previous binary {}: {source}", path.display())]
    StaleBinary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Causes of a pipeline-fatal failure
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("cannot create build directory: {0}")]
    BuildDir(#[source] io::Error),

    #[error("cannot write driver {}: {source}", path.display())]
    WriteDriver {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A fatal error, tagged with the pipeline stage it came from.
///
/// Displays as `<stage>: <cause>`.
#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct PipelineError {
    pub stage: &'static str,
    #[source]
    pub source: HarnessError,
}

impl PipelineError {
    pub fn new(stage: &'static str, source: impl Into<HarnessError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
