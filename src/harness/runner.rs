//! The harness pipeline.
//!
//! A run is a fixed list of named stages over a shared [`RunState`]. Stages execute in order; the
//! first fatal error stops the run and is reported with the name of the stage that raised it.
//! File-scoped problems never stop the run: they are logged and the file drops out.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, debug_span, warn};

use super::aggregate::{AggregateResult, Aggregator};
use super::analyzer::{ParsedInfo, analyze_file};
use super::build_dir::BuildDirectory;
use super::config::RunConfig;
use super::discovery::{discover, short_name};
use super::driver::{DriverArtifact, DriverTemplate};
use super::error::{FileError, HarnessError, PipelineError};
use super::executor::{ExecuteError, Executor};
use super::process::ProcessRunner;

/// One candidate file as it moves through the pipeline.
#[derive(Debug, Clone)]
pub struct HarnessFile {
    /// Position after filtering and sorting, contiguous from 0.
    pub id: usize,
    pub full_path: PathBuf,
    /// Path relative to the project root, used in logs and failure locations.
    pub short_name: String,
    /// `None` until parsed, and for files that failed to parse.
    pub info: Option<ParsedInfo>,
    pub driver: Option<DriverArtifact>,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunResult {
    pub aggregate: AggregateResult,
    /// Build directory left on disk because the run asked to keep it.
    pub kept_build_dir: Option<PathBuf>,
}

/// Mutable state shared by the stages of one run.
struct RunState<'a> {
    config: RunConfig,
    runner: &'a dyn ProcessRunner,
    live_stderr: &'a mut dyn Write,
    template: DriverTemplate,
    build: Option<BuildDirectory>,
    files: Vec<HarnessFile>,
    aggregator: Aggregator,
}

type Stage = fn(&mut RunState<'_>) -> Result<(), HarnessError>;

/// Pipeline stages, in execution order.
const STAGES: &[(&str, Stage)] = &[
    ("find files", find_files),
    ("prepare temp build dir", prepare_build_dir),
    ("parse files", parse_files),
    ("filter parsed files", filter_parsed_files),
    ("sort files", sort_files),
    ("generate drivers", generate_drivers),
    ("run", run_drivers),
];

/// Run the whole pipeline for `config`.
///
/// Child processes go through `runner`; their stderr is streamed to `live_stderr` as it arrives.
/// The build directory is released before this returns, on success and on error alike.
pub fn run(config: &RunConfig, runner: &dyn ProcessRunner, live_stderr: &mut dyn Write) -> Result<RunResult, PipelineError> {
    let start = Instant::now();

    let mut config = config.clone();
    if let Ok(root) = std::path::absolute(&config.project_root) {
        config.project_root = root;
    }

    let mut state = RunState {
        template: DriverTemplate::new(config.mode),
        aggregator: Aggregator::new(config.mode),
        config,
        runner,
        live_stderr,
        build: None,
        files: Vec::new(),
    };

    for &(name, stage) in STAGES {
        let _span = debug_span!("stage", stage = name).entered();
        stage(&mut state).map_err(|e| PipelineError::new(name, e))?;
    }

    let kept_build_dir = state.build.take().and_then(BuildDirectory::close);
    Ok(RunResult {
        aggregate: state.aggregator.finish(start.elapsed()),
        kept_build_dir,
    })
}

// ============================================================================
// Stages
// ============================================================================

fn find_files(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let paths = discover(&state.config.target, state.config.mode)?;
    state.files = paths
        .into_iter()
        .map(|full_path| HarnessFile {
            id: 0,
            short_name: short_name(&full_path, &state.config.project_root),
            full_path,
            info: None,
            driver: None,
        })
        .collect();
    Ok(())
}

fn prepare_build_dir(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let build = BuildDirectory::create(state.config.keep_build_dir).map_err(HarnessError::BuildDir)?;
    debug!(path = %build.path().display(), "created build directory");
    state.build = Some(build);
    Ok(())
}

fn parse_files(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let mode = state.config.mode;
    for file in &mut state.files {
        match analyze_file(&file.full_path, mode) {
            Ok(info) => file.info = Some(info),
            Err(e) => warn!(file = %file.short_name, stage = "parse files", "{}", e),
        }
    }
    Ok(())
}

/// Drop files that failed to parse or have no matching class.
///
/// Parse failures were already logged one by one; classless files get a single summary.
fn filter_parsed_files(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let mut classless = Vec::new();
    state.files.retain(|file| match &file.info {
        Some(info) if info.has_class() => true,
        Some(_) => {
            classless.push(file.short_name.clone());
            false
        }
        None => false,
    });

    if !classless.is_empty() {
        warn!(
            count = classless.len(),
            "no {} class found in: {}",
            state.config.mode.as_str(),
            classless.join(", ")
        );
    }
    Ok(())
}

fn sort_files(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    state.files.sort_by(|a, b| a.full_path.cmp(&b.full_path));
    for (id, file) in state.files.iter_mut().enumerate() {
        file.id = id;
    }
    Ok(())
}

fn generate_drivers(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let bootstrap = state.config.bootstrap();
    for file in &mut state.files {
        let Some(info) = &file.info else {
            continue;
        };
        match state.template.render(info, &file.full_path, bootstrap.as_deref()) {
            Ok(driver) => file.driver = Some(driver),
            Err(e) => warn!(file = %file.short_name, stage = "generate drivers", "{}", FileError::from(e)),
        }
    }
    Ok(())
}

fn run_drivers(state: &mut RunState<'_>) -> Result<(), HarnessError> {
    let RunState {
        config,
        runner,
        live_stderr,
        build,
        files,
        aggregator,
        ..
    } = state;
    let Some(build) = build.as_ref() else {
        return Err(HarnessError::BuildDir(std::io::Error::other("build directory was not prepared")));
    };
    let executor = Executor::new(config, *runner, build);

    for file in files.iter() {
        let Some(driver) = &file.driver else {
            continue;
        };
        debug!(id = file.id, file = %file.short_name, "running");
        match executor.run_file(&file.short_name, driver, &mut **live_stderr) {
            Ok(executions) => aggregator.add_file(&file.short_name, &executions),
            Err(ExecuteError::File(e)) => warn!(file = %file.short_name, stage = "run", "{}", e),
            Err(ExecuteError::Fatal(e)) => return Err(e),
        }
    }
    Ok(())
}
