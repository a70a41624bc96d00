//! Per-request workspace directories.
//!
//! Each build gets its own directory under the temp root:
//!
//! ```text
//! compilePojo-<uuid>/
//! ├── Model1.java        # staged inputs
//! ├── h2o-genmodel.jar
//! ├── H2OPredictor.java  # helper source from the resource pack
//! ├── lib/               # support libraries from the resource pack
//! ├── out/               # compiler output, extracted dependencies
//! │   └── META-INF/MANIFEST.txt
//! └── result.jar
//! ```
//!
//! The directory is removed when the [`Workspace`] is released or dropped.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};

/// Name of the compiler output directory inside a workspace.
pub const OUT_DIR: &str = "out";

/// Name of the packaged archive inside a workspace.
pub const RESULT_ARCHIVE: &str = "result.jar";

/// An exclusively-owned build directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    out_dir: PathBuf,
    keep: bool,
    released: bool,
}

impl Workspace {
    /// Create a new uniquely-named workspace with an empty `out` directory.
    pub fn allocate(config: &WorkspaceConfig) -> Result<Self> {
        let root = config
            .temp_root
            .join(format!("{}-{}", config.prefix, Uuid::new_v4()));

        // create_dir (not create_dir_all) so an existing directory is never reused
        fs::create_dir(&root).map_err(|source| Error::Workspace {
            path: root.clone(),
            source,
        })?;

        let out_dir = root.join(OUT_DIR);
        if let Err(source) = fs::create_dir(&out_dir) {
            let _ = fs::remove_dir_all(&root);
            return Err(Error::Workspace {
                path: out_dir,
                source,
            });
        }

        tracing::info!(workspace = %root.display(), "allocated workspace");

        Ok(Self {
            root,
            out_dir,
            keep: config.keep,
            released: false,
        })
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The compiler output directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of a file directly inside the workspace root.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of the packaged result archive.
    pub fn result_archive(&self) -> PathBuf {
        self.root.join(RESULT_ARCHIVE)
    }

    /// Release the workspace, deleting it unless configured to keep it.
    ///
    /// Deletion is best-effort: failures are logged and otherwise ignored.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.keep {
            tracing::info!(workspace = %self.root.display(), "keeping workspace");
            return;
        }

        match fs::remove_dir_all(&self.root) {
            Ok(()) => tracing::debug!(workspace = %self.root.display(), "removed workspace"),
            Err(e) => tracing::warn!(
                workspace = %self.root.display(),
                error = %e,
                "failed to remove workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> WorkspaceConfig {
        WorkspaceConfig {
            temp_root: temp.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_allocate_creates_out_dir() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let ws = Workspace::allocate(&config_in(&temp)).expect("Failed to allocate");

        assert!(ws.root().is_dir());
        assert!(ws.out_dir().is_dir());
        assert!(ws.root().starts_with(temp.path()));
        assert!(
            ws.root()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("compilePojo-"))
        );
    }

    #[test]
    fn test_allocations_are_distinct() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = config_in(&temp);
        let a = Workspace::allocate(&config).expect("Failed to allocate");
        let b = Workspace::allocate(&config).expect("Failed to allocate");
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_release_removes_directory() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let ws = Workspace::allocate(&config_in(&temp)).expect("Failed to allocate");
        fs::write(ws.path("Model1.java"), "class Model1 {}").unwrap();
        let root = ws.root().to_path_buf();

        ws.release();
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = {
            let ws = Workspace::allocate(&config_in(&temp)).expect("Failed to allocate");
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_keep_leaves_directory() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = WorkspaceConfig {
            keep: true,
            ..config_in(&temp)
        };
        let ws = Workspace::allocate(&config).expect("Failed to allocate");
        let root = ws.root().to_path_buf();

        ws.release();
        assert!(root.is_dir());
    }

    #[test]
    fn test_missing_temp_root_fails() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = WorkspaceConfig {
            temp_root: temp.path().join("does-not-exist"),
            ..Default::default()
        };
        let err = Workspace::allocate(&config).unwrap_err();
        assert!(matches!(err, Error::Workspace { .. }));
    }
}
