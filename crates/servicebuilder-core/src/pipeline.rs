//! The build pipeline.
//!
//! ```text
//! payloads ──► Workspace::allocate ──► stage ──► assemble
//!                                                  │
//!                       read_result ◄── pack ◄── compile each source
//!                            │
//!                            └──► Workspace::release (every exit path)
//! ```

use std::sync::Arc;

use crate::archive::build_archive;
use crate::config::BuilderConfig;
use crate::emit::{BuildOutcome, read_result};
use crate::error::Result;
use crate::resources::assemble;
use crate::stage::{NamedPayload, stage};
use crate::toolchain::{CompileSettings, Compiler, ProcessRunner, ToolRunner};
use crate::workspace::Workspace;

/// Compiles uploaded sources into a result archive.
///
/// Cheap to clone; clones share the configuration and runner. Each call to
/// [`ServiceBuilder::build`] works in its own workspace, so concurrent calls
/// do not interfere.
#[derive(Clone)]
pub struct ServiceBuilder {
    config: Arc<BuilderConfig>,
    runner: Arc<dyn ToolRunner>,
}

impl ServiceBuilder {
    /// Create a builder that runs the toolchain as child processes.
    pub fn new(config: BuilderConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }

    /// Create a builder with a custom tool runner.
    pub fn with_runner(config: BuilderConfig, runner: impl ToolRunner + 'static) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Run the full pipeline and return the result archive bytes.
    pub fn build(&self, payloads: &[NamedPayload]) -> Result<Vec<u8>> {
        let workspace = Workspace::allocate(&self.config.workspace)?;
        let result = self.build_in(&workspace, payloads);
        workspace.release();
        result
    }

    /// Run the pipeline and convert the result into an outcome.
    pub fn handle(&self, payloads: &[NamedPayload]) -> BuildOutcome {
        BuildOutcome::from(self.build(payloads))
    }

    fn build_in(&self, workspace: &Workspace, payloads: &[NamedPayload]) -> Result<Vec<u8>> {
        let config = &*self.config;

        let helper_source = config.resources.helper_source_name()?;
        let staged = stage(workspace, payloads, &helper_source)?;
        tracing::info!(
            sources = ?staged.sources,
            runtime_archive = %staged.runtime_archive,
            "staged inputs"
        );

        // The pack may have changed since startup
        config.resources.validate()?;
        assemble(workspace, &config.resources)?;

        let settings = CompileSettings {
            toolchain: &config.toolchain,
            target_version: &config.java_target_version,
            memory: &config.java_memory,
            runtime_archive: &staged.runtime_archive,
            helper_source: &helper_source,
        };
        Compiler::new(self.runner.as_ref(), settings)
            .compile_all(workspace.root(), &staged.sources)?;

        let archive = build_archive(
            self.runner.as_ref(),
            &config.toolchain,
            workspace,
            &staged,
            &config.resources,
        )?;

        let bytes = read_result(&archive)?;
        tracing::info!("Done compile and jar");
        Ok(bytes)
    }
}
