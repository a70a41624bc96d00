//! Build pipeline for the scoring service builder.
//!
//! Compiles generated scoring POJOs against an uploaded `h2o-genmodel.jar`
//! and repackages the classes, the runtime and the support library into a
//! single jar.
//!
//! This crate provides:
//! - Per-request workspace allocation and cleanup
//! - Staging of uploaded payloads
//! - Assembly of the bundled resource pack
//! - Compiler and archiver invocation
//! - Structured failure reporting

pub mod archive;
pub mod config;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod resources;
pub mod stage;
pub mod toolchain;
pub mod workspace;

pub use config::{BuilderConfig, WorkspaceConfig};
pub use emit::{ARCHIVE_CONTENT_TYPE, BuildOutcome, ErrorPayload};
pub use error::{Error, ErrorKind, Result};
pub use pipeline::ServiceBuilder;
pub use resources::ResourcePack;
pub use stage::{NamedPayload, PayloadRole, StagedInputs};
pub use toolchain::{
    ProcessRunner, ToolFailure, ToolInvocation, ToolOutput, ToolRunner, ToolStage, Toolchain,
};
pub use workspace::Workspace;
