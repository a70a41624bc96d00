//! Staging of uploaded payloads into a workspace.

use std::collections::HashSet;
use std::fs;

use crate::error::{Error, Result};
use crate::resources::LIB_DIR;
use crate::workspace::{OUT_DIR, RESULT_ARCHIVE, Workspace};

/// Form field carrying a scoring POJO.
pub const SOURCE_FIELD: &str = "pojo";

/// Form field carrying the runtime archive.
pub const RUNTIME_ARCHIVE_FIELD: &str = "jar";

/// Message returned when the request lacks a source or runtime archive.
pub const MISSING_INPUTS_MESSAGE: &str = "need pojo file(s) and jar file";

/// Role of an uploaded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRole {
    /// A source file to compile.
    Source,
    /// The runtime archive the sources compile against.
    RuntimeArchive,
    /// Any other named file; staged but otherwise unused.
    Other(String),
}

impl PayloadRole {
    /// Map a multipart field name to a role.
    pub fn from_field(field: &str) -> Self {
        match field {
            SOURCE_FIELD => Self::Source,
            RUNTIME_ARCHIVE_FIELD => Self::RuntimeArchive,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct NamedPayload {
    pub role: PayloadRole,
    /// File name as declared by the client. Empty for plain form fields.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl NamedPayload {
    pub fn new(role: PayloadRole, file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            role,
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn source(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(PayloadRole::Source, file_name, bytes)
    }

    pub fn runtime_archive(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(PayloadRole::RuntimeArchive, file_name, bytes)
    }
}

/// File names of the staged inputs, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInputs {
    /// Source files in upload order.
    pub sources: Vec<String>,
    pub runtime_archive: String,
}

/// Write every named payload into the workspace root and classify it.
///
/// `helper_source` is the file name the resource pack copies into the root
/// afterwards; uploads may not claim it.
pub fn stage(
    workspace: &Workspace,
    payloads: &[NamedPayload],
    helper_source: &str,
) -> Result<StagedInputs> {
    let mut sources = Vec::new();
    let mut runtime_archive: Option<String> = None;
    let mut seen = HashSet::new();

    for payload in payloads {
        if payload.file_name.is_empty() {
            continue;
        }

        let name = flat_file_name(&payload.file_name, helper_source)?;
        if !seen.insert(name.clone()) {
            return Err(Error::InvalidRequest(format!(
                "duplicate file name: {}",
                name
            )));
        }

        match &payload.role {
            PayloadRole::Source => sources.push(name.clone()),
            PayloadRole::RuntimeArchive => {
                if runtime_archive.is_some() {
                    return Err(Error::InvalidRequest(
                        "only one jar file may be supplied".to_string(),
                    ));
                }
                runtime_archive = Some(name.clone());
            }
            PayloadRole::Other(field) => {
                tracing::debug!(
                    field = %field,
                    file = %name,
                    "staging file from unrecognized field"
                );
            }
        }

        fs::write(workspace.path(&name), &payload.bytes)?;
        tracing::debug!(file = %name, bytes = payload.bytes.len(), "staged input");
    }

    match runtime_archive {
        Some(runtime_archive) if !sources.is_empty() => Ok(StagedInputs {
            sources,
            runtime_archive,
        }),
        _ => Err(Error::InvalidRequest(MISSING_INPUTS_MESSAGE.to_string())),
    }
}

/// Reduce a client-supplied name to a single path component.
///
/// Browsers on Windows may send full paths with backslashes, so both
/// separators are stripped regardless of platform.
fn flat_file_name(declared: &str, helper_source: &str) -> Result<String> {
    let base = declared.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." {
        return Err(Error::InvalidRequest(format!(
            "invalid file name: {:?}",
            declared
        )));
    }
    if [OUT_DIR, LIB_DIR, RESULT_ARCHIVE, helper_source].contains(&base) {
        return Err(Error::InvalidRequest(format!(
            "reserved file name: {}",
            base
        )));
    }

    Ok(base.to_string())
}
