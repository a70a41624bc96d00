//! The resource pack and its assembly into a workspace.
//!
//! The resource pack is a read-only directory shipped with the deployment:
//!
//! ```text
//! <root>/extra/
//! ├── H2OPredictor.java   # helper every generated POJO compiles against
//! ├── MANIFEST.txt        # manifest template for the result jar
//! └── WEB-INF/lib/        # support libraries (gson, ...)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::workspace::Workspace;

/// Name of the library directory inside a workspace.
pub const LIB_DIR: &str = "lib";

/// Location of the manifest relative to the output directory.
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.txt";

/// Support library extracted into every result archive.
pub const DEFAULT_SUPPORT_LIBRARY: &str = "gson-2.6.2.jar";

/// Location and layout of the bundled auxiliary files.
#[derive(Debug, Clone)]
pub struct ResourcePack {
    /// Resource pack root. Requests fail until this is set.
    root: Option<PathBuf>,

    /// Helper source, relative to the root.
    pub helper_source: PathBuf,

    /// Manifest template, relative to the root.
    pub manifest_template: PathBuf,

    /// Support library directory, relative to the root.
    pub library_dir: PathBuf,

    /// File name of the support library to merge into the result.
    pub support_library: String,
}

impl Default for ResourcePack {
    fn default() -> Self {
        Self {
            root: None,
            helper_source: Path::new("extra").join("H2OPredictor.java"),
            manifest_template: Path::new("extra").join("MANIFEST.txt"),
            library_dir: Path::new("extra").join("WEB-INF").join("lib"),
            support_library: DEFAULT_SUPPORT_LIBRARY.to_string(),
        }
    }
}

impl ResourcePack {
    /// Resource pack with the standard layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// The resource pack root.
    pub fn root(&self) -> Result<&Path> {
        self.root
            .as_deref()
            .ok_or_else(|| Error::resource("resource pack root is not set"))
    }

    /// Absolute path of the helper source.
    pub fn helper_source_path(&self) -> Result<PathBuf> {
        Ok(self.root()?.join(&self.helper_source))
    }

    /// File name of the helper source as it appears in a workspace.
    pub fn helper_source_name(&self) -> Result<String> {
        self.helper_source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::resource(format!(
                    "helper source has no file name: {}",
                    self.helper_source.display()
                ))
            })
    }

    /// Absolute path of the manifest template.
    pub fn manifest_template_path(&self) -> Result<PathBuf> {
        Ok(self.root()?.join(&self.manifest_template))
    }

    /// Absolute path of the support library directory.
    pub fn library_dir_path(&self) -> Result<PathBuf> {
        Ok(self.root()?.join(&self.library_dir))
    }

    /// Check that every file the pipeline needs is present.
    pub fn validate(&self) -> Result<()> {
        let root = self.root()?;
        if !root.is_dir() {
            return Err(Error::resource(format!(
                "resource pack root is not a directory: {}",
                root.display()
            )));
        }

        for file in [self.helper_source_path()?, self.manifest_template_path()?] {
            if !file.is_file() {
                return Err(Error::resource(format!("missing resource: {}", file.display())));
            }
        }

        let support = self.library_dir_path()?.join(&self.support_library);
        if !support.is_file() {
            return Err(Error::resource(format!(
                "missing support library: {}",
                support.display()
            )));
        }

        Ok(())
    }
}

/// Copy the helper source, support libraries and manifest into a workspace.
pub fn assemble(workspace: &Workspace, pack: &ResourcePack) -> Result<()> {
    let helper = pack.helper_source_path()?;
    let helper_dest = workspace.path(&pack.helper_source_name()?);
    fs::copy(&helper, &helper_dest).map_err(|e| {
        Error::resource_io(format!("failed to copy {}", helper.display()), e)
    })?;

    let library_dir = pack.library_dir_path()?;
    copy_dir(&library_dir, &workspace.path(LIB_DIR))?;

    let manifest = pack.manifest_template_path()?;
    let manifest_dest = workspace.out_dir().join(MANIFEST_ENTRY);
    if let Some(parent) = manifest_dest.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::resource_io(format!("failed to create {}", parent.display()), e)
        })?;
    }
    fs::copy(&manifest, &manifest_dest).map_err(|e| {
        Error::resource_io(format!("failed to copy {}", manifest.display()), e)
    })?;

    tracing::debug!(workspace = %workspace.root().display(), "assembled resources");
    Ok(())
}

/// Recursively copy `src` to `dest`, creating `dest`.
fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    if !src.is_dir() {
        return Err(Error::resource(format!(
            "library directory not found: {}",
            src.display()
        )));
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let message = format!("failed to read {}", src.display());
            match e.into_io_error() {
                Some(io) => Error::resource_io(message, io),
                None => Error::resource(message),
            }
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| Error::resource(format!("unexpected path {}", entry.path().display())))?;
        let target = dest.join(relative);

        let copied = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };
        copied.map_err(|e| {
            Error::resource_io(format!("failed to copy {}", entry.path().display()), e)
        })?;
    }

    Ok(())
}
