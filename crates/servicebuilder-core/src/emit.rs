//! Build results and client-facing diagnostics.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// Placeholder used when an error renders to an empty message.
pub const NO_MESSAGE: &str = "no message";

/// Content type of a successful response.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/octet-stream";

/// Read the packaged archive fully into memory.
///
/// The archiver can exit zero yet leave a missing or zero-byte file when
/// the disk fills up, so both are reported as [`Error::EmptyArtifact`].
pub fn read_result(path: &Path) -> Result<Vec<u8>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if bytes.is_empty() {
        return Err(Error::EmptyArtifact {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(size = bytes.len(), "jar created");
    Ok(bytes)
}

/// Structured failure reported to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    /// Source file that failed to compile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Packaging step that failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Compiler or archiver output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Underlying causes, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorPayload {
    pub fn from_error(err: &Error) -> Self {
        let mut message = err.to_string();
        if message.trim().is_empty() {
            message = NO_MESSAGE.to_string();
        }

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind: err.kind(),
            message,
            file: err.offending_file().map(str::to_string),
            step: err.failed_step().map(str::to_string),
            output: err.tool_output().map(str::to_string),
            causes,
        }
    }

    /// JSON rendering of the payload.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

/// Outcome of one build request. Exactly one is produced per request.
#[derive(Debug)]
pub enum BuildOutcome {
    Archive(Vec<u8>),
    Failure(ErrorPayload),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Archive(_))
    }
}

impl From<Result<Vec<u8>>> for BuildOutcome {
    fn from(result: Result<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) => Self::Archive(bytes),
            Err(e) => {
                tracing::error!(error = %e, "build failed");
                Self::Failure(ErrorPayload::from_error(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_read_result_returns_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("result.jar");
        fs::write(&path, b"PK\x03\x04").unwrap();

        assert_eq!(read_result(&path).unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn test_read_result_rejects_empty_and_missing() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("result.jar");
        fs::write(&empty, b"").unwrap();

        assert!(matches!(read_result(&empty), Err(Error::EmptyArtifact { .. })));
        assert!(matches!(
            read_result(&temp.path().join("missing.jar")),
            Err(Error::EmptyArtifact { .. })
        ));
    }

    #[test]
    fn test_payload_for_compilation_error() {
        let err = Error::Compilation {
            file: "Model2.java".to_string(),
            message: "exit status 1\nModel2.java:5: error: cannot find symbol".to_string(),
        };
        let payload = ErrorPayload::from_error(&err);

        assert_eq!(payload.kind, ErrorKind::CompilationError);
        assert_eq!(payload.file.as_deref(), Some("Model2.java"));
        assert!(payload.output.unwrap().contains("cannot find symbol"));
    }

    #[test]
    fn test_payload_json_includes_causes() {
        let err = Error::resource_io(
            "failed to copy /pack/extra/MANIFEST.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        let json: serde_json::Value =
            serde_json::from_str(&ErrorPayload::from_error(&err).to_json()).unwrap();

        assert_eq!(json["kind"], "resource_error");
        assert_eq!(json["causes"][0], "No such file or directory");
        assert!(json.get("file").is_none());
    }

    #[test]
    fn test_empty_message_falls_back() {
        let payload = ErrorPayload::from_error(&Error::InvalidRequest(String::new()));
        assert_eq!(payload.message, NO_MESSAGE);
    }

    #[test]
    fn test_outcome_from_result() {
        assert!(BuildOutcome::from(Ok::<_, Error>(vec![1u8])).is_success());
        let failed = BuildOutcome::from(Err(Error::EmptyArtifact {
            path: PathBuf::from("result.jar"),
        }));
        assert!(!failed.is_success());
    }
}
