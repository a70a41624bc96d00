//! Error types for servicebuilder-core.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type for servicebuilder-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a scoring archive.
#[derive(Debug, Error)]
pub enum Error {
    /// The request is missing inputs or carries unusable file names.
    #[error("{0}")]
    InvalidRequest(String),

    /// The per-request workspace could not be created.
    #[error("failed to create workspace {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resource pack is unset, missing, or unreadable.
    #[error("resource error: {message}")]
    Resource {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The compiler or archiver could not be located.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// A source file failed to compile.
    #[error("Compilation of pojo failed: {file}")]
    Compilation { file: String, message: String },

    /// A post-compilation archiving step failed.
    #[error("{step}")]
    Packaging { step: String, message: String },

    /// The archiver exited cleanly but produced nothing.
    #[error("Can't create jar of compiler output: {} is empty", path.display())]
    EmptyArtifact { path: PathBuf },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    WorkspaceError,
    ResourceError,
    CompilationError,
    PackagingError,
    EmptyArtifactError,
    IoError,
}

impl Error {
    /// Create a resource error without an underlying IO cause.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
            source: None,
        }
    }

    /// Create a resource error caused by a failed filesystem operation.
    pub fn resource_io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Workspace { .. } => ErrorKind::WorkspaceError,
            Self::Resource { .. } | Self::Toolchain(_) => ErrorKind::ResourceError,
            Self::Compilation { .. } => ErrorKind::CompilationError,
            Self::Packaging { .. } => ErrorKind::PackagingError,
            Self::EmptyArtifact { .. } => ErrorKind::EmptyArtifactError,
            Self::Io(_) => ErrorKind::IoError,
        }
    }

    /// The source file that failed to compile, if any.
    pub fn offending_file(&self) -> Option<&str> {
        match self {
            Self::Compilation { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Label of the packaging step that failed, if any.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::Packaging { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Captured tool output for compilation and packaging failures.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::Compilation { message, .. } | Self::Packaging { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::InvalidRequest("x".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(Error::resource("x").kind(), ErrorKind::ResourceError);
        assert_eq!(Error::Toolchain("x".into()).kind(), ErrorKind::ResourceError);
        assert_eq!(
            Error::EmptyArtifact {
                path: PathBuf::from("result.jar")
            }
            .kind(),
            ErrorKind::EmptyArtifactError
        );
    }

    #[test]
    fn test_compilation_error_names_file() {
        let err = Error::Compilation {
            file: "Model7.java".to_string(),
            message: "Model7.java:3: error: ';' expected".to_string(),
        };
        assert_eq!(err.offending_file(), Some("Model7.java"));
        assert!(err.to_string().contains("Model7.java"));
        assert_eq!(err.tool_output(), Some("Model7.java:3: error: ';' expected"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::CompilationError).unwrap();
        assert_eq!(json, "\"compilation_error\"");
    }
}
