//! Candidate file discovery.
//!
//! A `.php` target is taken as-is. A directory target is walked recursively, skipping hidden
//! directories and `vendor/`, and every file whose name follows the mode's naming convention is
//! collected.
//! Results are absolute and sorted by path so runs are reproducible.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::config::RunMode;
use super::error::DiscoveryError;

/// Find candidate files for `mode` under `target`.
pub fn discover(target: &Path, mode: RunMode) -> Result<Vec<PathBuf>, DiscoveryError> {
    let target = std::path::absolute(target).map_err(|source| DiscoveryError::Io {
        path: target.to_path_buf(),
        source,
    })?;

    let metadata = match std::fs::metadata(&target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DiscoveryError::NotFound { path: target });
        }
        Err(source) => return Err(DiscoveryError::Io { path: target, source }),
    };

    if metadata.is_file() {
        if target.extension().is_some_and(|ext| ext == "php") {
            return Ok(vec![target]);
        }
        return Err(DiscoveryError::NotPhp { path: target });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(&target)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: target.clone(),
            source,
        })?;
        if entry.file_type().is_file() && mode.matches_file_name(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(count = files.len(), target = %target.display(), "discovered candidate files");
    Ok(files)
}

/// Hidden directories and composer's `vendor/` never hold files to run.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "vendor"
}

/// Path of `path` relative to `root`, or the full path when it lies outside the root.
pub fn short_name(path: &Path, root: &Path) -> String {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<?php\n").unwrap();
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b/ZetaTest.php");
        touch(dir.path(), "a/AlphaTest.php");
        touch(dir.path(), "a/Helper.php");
        touch(dir.path(), "a/AlphaBench.php");
        touch(dir.path(), "c/BenchmarkSort.php");
        touch(dir.path(), "vendor/lib/VendorTest.php");
        touch(dir.path(), ".git/HiddenTest.php");

        let files = discover(dir.path(), RunMode::Test).unwrap();
        let names: Vec<_> = files.iter().map(|f| short_name(f, dir.path())).collect();
        assert_eq!(names, vec!["a/AlphaTest.php", "b/ZetaTest.php"]);

        let benches = discover(dir.path(), RunMode::Bench).unwrap();
        let names: Vec<_> = benches.iter().map(|f| short_name(f, dir.path())).collect();
        assert_eq!(names, vec!["a/AlphaBench.php", "c/BenchmarkSort.php"]);
    }

    #[test]
    fn test_discover_single_file_target() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Anything.php");
        let files = discover(&dir.path().join("Anything.php"), RunMode::Test).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("missing"), RunMode::Test).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { .. }));
    }

    #[test]
    fn test_discover_non_php_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let err = discover(&dir.path().join("notes.txt"), RunMode::Test).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotPhp { .. }));
    }

    #[test]
    fn test_short_name_outside_root() {
        let name = short_name(Path::new("/elsewhere/FooTest.php"), Path::new("/project"));
        assert_eq!(name, "/elsewhere/FooTest.php");
    }
}
