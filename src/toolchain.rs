//! Location of the KPHP toolchain.
//!
//! The root comes from `KPHP_ROOT`, falling back to `~/kphp` when that directory exists. The
//! compiler lives at `<root>/objs/bin/kphp2cpp`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const ROOT_VAR: &str = "KPHP_ROOT";
pub const POLYFILLS_VAR: &str = "KPHP_TESTS_POLYFILLS_REPO";

/// Variables reported by `kharness env`.
pub const REPORTED_VARS: &[&str] = &[ROOT_VAR, POLYFILLS_VAR];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolchainError {
    #[error("KPHP_ROOT points to a non-existing directory: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("$KPHP_ROOT is not set and ~/kphp does not exist")]
    NotSet,
}

/// Resolve the toolchain root from the environment.
pub fn find_root() -> Result<PathBuf, ToolchainError> {
    find_root_from(env::var_os(ROOT_VAR), dirs::home_dir())
}

/// Resolve the root from an explicit `KPHP_ROOT` value and home directory.
pub fn find_root_from(env_root: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf, ToolchainError> {
    if let Some(root) = env_root.filter(|r| !r.is_empty()) {
        let root = PathBuf::from(root);
        if !root.exists() {
            return Err(ToolchainError::MissingRoot(root));
        }
        debug!(root = %root.display(), "toolchain root from {}", ROOT_VAR);
        return Ok(root);
    }

    match home.map(|h| h.join("kphp")) {
        Some(root) if root.exists() => {
            debug!(root = %root.display(), "toolchain root from home directory");
            Ok(root)
        }
        _ => Err(ToolchainError::NotSet),
    }
}

/// Compiler binary inside a toolchain root.
pub fn compiler_binary(root: &Path) -> PathBuf {
    root.join("objs").join("bin").join("kphp2cpp")
}

/// `NAME="value"` lines for every reported variable; unset variables print as empty.
pub fn describe_env() -> String {
    describe_vars(|name| env::var(name).unwrap_or_default())
}

fn describe_vars(lookup: impl Fn(&str) -> String) -> String {
    REPORTED_VARS
        .iter()
        .map(|name| format!("{}={:?}\n", name, lookup(name)))
        .collect()
}
