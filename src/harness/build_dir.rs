//! Scoped build directory.
//!
//! Every run owns one temporary directory for drivers and compiled binaries. It is removed when the
//! [`BuildDirectory`] is dropped, on every exit path, unless the run asked to keep it.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use super::driver::DriverArtifact;

/// Name of the binary the compiler produces in CLI mode.
pub const COMPILED_BINARY: &str = "cli";

#[derive(Debug)]
pub struct BuildDirectory {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl BuildDirectory {
    /// Create a fresh build directory under the system temp dir.
    pub fn create(keep: bool) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("kharness-").tempdir()?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the compiled binary ends up.
    pub fn binary(&self) -> PathBuf {
        self.path.join(COMPILED_BINARY)
    }

    /// Write `artifact` and its support files into the directory, replacing the previous driver.
    /// Returns the driver's path.
    pub fn write_driver(&self, artifact: &DriverArtifact) -> io::Result<PathBuf> {
        for file in artifact.support {
            std::fs::write(self.path.join(file.filename), file.contents)?;
        }
        let path = self.path.join(artifact.filename);
        std::fs::write(&path, &artifact.script)?;
        Ok(path)
    }

    /// Release the directory now. Returns its path if it was kept.
    pub fn close(mut self) -> Option<PathBuf> {
        self.release()
    }

    fn release(&mut self) -> Option<PathBuf> {
        let dir = self.dir.take()?;
        if self.keep {
            let path = dir.keep();
            info!(path = %path.display(), "keeping build directory");
            Some(path)
        } else {
            if let Err(e) = dir.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove build directory");
            }
            None
        }
    }
}

impl Drop for BuildDirectory {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::harness::driver::SupportFile;

    fn artifact() -> DriverArtifact {
        DriverArtifact {
            filename: "main.php",
            script: "<?php\n".to_string(),
            support: &[],
        }
    }

    #[test]
    fn test_removed_on_drop() {
        let build = BuildDirectory::create(false).unwrap();
        let path = build.path().to_path_buf();
        build.write_driver(&artifact()).unwrap();
        assert!(path.join("main.php").is_file());
        drop(build);
        assert!(!path.exists());
    }

    #[test]
    fn test_support_files_written_next_to_driver() {
        const SUPPORT: &[SupportFile] = &[SupportFile {
            filename: "lib.php",
            contents: "<?php // lib\n",
        }];
        let build = BuildDirectory::create(false).unwrap();
        let artifact = DriverArtifact {
            support: SUPPORT,
            ..artifact()
        };
        build.write_driver(&artifact).unwrap();
        assert_eq!(std::fs::read_to_string(build.path().join("lib.php")).unwrap(), "<?php // lib\n");
        assert!(build.path().join("main.php").is_file());
    }

    #[test]
    fn test_close_without_keep() {
        let build = BuildDirectory::create(false).unwrap();
        let path = build.path().to_path_buf();
        assert_eq!(build.close(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_when_requested() {
        let build = BuildDirectory::create(true).unwrap();
        let path = build.path().to_path_buf();
        let kept = build.close();
        assert_eq!(kept.as_deref(), Some(path.as_path()));
        assert!(path.exists());
        std::fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_binary_path() {
        let build = BuildDirectory::create(false).unwrap();
        assert_eq!(build.binary(), build.path().join("cli"));
    }
}
