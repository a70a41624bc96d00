//! Configuration for the build pipeline.
//!
//! All settings are fixed when the service starts and shared read-only
//! across requests.

use std::path::PathBuf;

use crate::resources::ResourcePack;
use crate::toolchain::Toolchain;

/// Default `-source`/`-target` level passed to the compiler.
pub const DEFAULT_JAVA_TARGET_VERSION: &str = "1.8";

/// Default maximum heap for the compiler process.
pub const DEFAULT_JAVA_MEMORY: &str = "4g";

/// Default prefix for workspace directory names.
pub const DEFAULT_WORKSPACE_PREFIX: &str = "compilePojo";

/// Configuration for the build pipeline.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Location and layout of the bundled auxiliary files.
    pub resources: ResourcePack,

    /// Compiler and archiver programs.
    pub toolchain: Toolchain,

    /// Language level for `-source` and `-target`.
    pub java_target_version: String,

    /// Heap size for the compiler (`-J-Xmx<value>`).
    pub java_memory: String,

    /// Workspace allocation settings.
    pub workspace: WorkspaceConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            resources: ResourcePack::default(),
            toolchain: Toolchain::default(),
            java_target_version: DEFAULT_JAVA_TARGET_VERSION.to_string(),
            java_memory: DEFAULT_JAVA_MEMORY.to_string(),
            workspace: WorkspaceConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Create a config that reads auxiliary files from `resources`.
    pub fn new(resources: ResourcePack) -> Self {
        Self {
            resources,
            ..Default::default()
        }
    }

    /// Use the given compiler and archiver.
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Leave workspaces on disk after each build.
    pub fn keep_workspaces(mut self, keep: bool) -> Self {
        self.workspace.keep = keep;
        self
    }
}

/// Settings for per-request workspace directories.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Directory under which workspaces are created.
    pub temp_root: PathBuf,

    /// Name prefix; a random suffix is appended.
    pub prefix: String,

    /// Skip deletion on release. Useful when debugging a failed build.
    pub keep: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
            keep: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::default();
        assert_eq!(config.java_target_version, "1.8");
        assert_eq!(config.java_memory, "4g");
        assert!(!config.workspace.keep);
        assert!(config.resources.root().is_err());
    }

    #[test]
    fn test_keep_workspaces() {
        let config = BuilderConfig::default().keep_workspaces(true);
        assert!(config.workspace.keep);
    }
}
