//! Shared fixtures for pipeline tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use servicebuilder_core::{
    BuilderConfig, ResourcePack, ToolFailure, ToolInvocation, ToolOutput, ToolRunner, ToolStage,
    WorkspaceConfig,
};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const HELPER_SOURCE: &str =
    "public class H2OPredictor {\n    public static final int VALUE = 1;\n}\n";

pub const MANIFEST: &str = "Manifest-Version: 1.0\nMain-Class: H2OPredictor\n";

/// Write a resource pack with the standard layout under `root`.
///
/// `support_library` is the content of `gson-2.6.2.jar`.
pub fn write_resource_pack(root: &Path, support_library: &[u8]) {
    let extra = root.join("extra");
    let lib = extra.join("WEB-INF").join("lib");
    fs::create_dir_all(&lib).expect("Failed to create lib dir");
    fs::write(extra.join("H2OPredictor.java"), HELPER_SOURCE).expect("Failed to write helper");
    fs::write(extra.join("MANIFEST.txt"), MANIFEST).expect("Failed to write manifest");
    fs::write(lib.join("gson-2.6.2.jar"), support_library).expect("Failed to write gson");
}

/// A resource pack and a private temp root for workspaces.
pub struct Fixture {
    pub pack_dir: TempDir,
    pub temp_root: TempDir,
}

impl Fixture {
    pub fn new(support_library: &[u8]) -> Self {
        let pack_dir = TempDir::new().expect("Failed to create pack dir");
        write_resource_pack(pack_dir.path(), support_library);
        Self {
            pack_dir,
            temp_root: TempDir::new().expect("Failed to create temp root"),
        }
    }

    pub fn config(&self) -> BuilderConfig {
        BuilderConfig {
            workspace: WorkspaceConfig {
                temp_root: self.temp_root.path().to_path_buf(),
                ..Default::default()
            },
            ..BuilderConfig::new(ResourcePack::new(self.pack_dir.path()))
        }
    }

    /// Workspaces currently present under the temp root.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        fs::read_dir(self.temp_root.path())
            .expect("Failed to read temp root")
            .map(|e| e.expect("Failed to read entry").path())
            .collect()
    }
}

/// Stands in for `javac` and `jar`.
///
/// - compiling `X.java` writes `out/X.class` and `out/H2OPredictor.class`,
///   or fails when the source contains `BROKEN`;
/// - `jar xf <archive>` writes `extracted-<archive name>` into the cwd;
/// - `jar cfm <result> ...` writes the sorted list of files under the cwd.
#[derive(Default)]
pub struct FakeJdk {
    pub invocations: Mutex<Vec<ToolInvocation>>,
    /// Produce a zero-byte result archive.
    pub empty_result: bool,
}

impl FakeJdk {
    pub fn labels(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.label.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    fn compile(&self, inv: &ToolInvocation, source: &str) -> Result<ToolOutput, ToolFailure> {
        let text = fs::read_to_string(inv.working_dir.join(source)).map_err(ToolFailure::Spawn)?;
        if text.contains("BROKEN") {
            return Err(ToolFailure::Exit {
                code: Some(1),
                output: format!("{}:1: error: illegal start of type", source),
            });
        }

        let out = inv.working_dir.join("out");
        let stem = source.trim_end_matches(".java");
        fs::write(out.join(format!("{}.class", stem)), format!("compiled {}", text))
            .map_err(ToolFailure::Spawn)?;
        fs::write(out.join("H2OPredictor.class"), "compiled helper").map_err(ToolFailure::Spawn)?;
        Ok(ToolOutput::default())
    }

    fn jar(&self, inv: &ToolInvocation) -> Result<ToolOutput, ToolFailure> {
        let args = inv.args_lossy();
        match args.first().map(String::as_str) {
            Some("xf") => {
                let archive = PathBuf::from(&args[1]);
                let bytes = fs::read(&archive).map_err(ToolFailure::Spawn)?;
                let name = archive.file_name().unwrap().to_string_lossy().into_owned();
                fs::write(inv.working_dir.join(format!("extracted-{}", name)), bytes)
                    .map_err(ToolFailure::Spawn)?;
            }
            Some("cfm") => {
                let listing = if self.empty_result {
                    String::new()
                } else {
                    list_files(&inv.working_dir).join("\n")
                };
                fs::write(&args[1], listing).map_err(ToolFailure::Spawn)?;
            }
            other => {
                return Err(ToolFailure::Exit {
                    code: Some(2),
                    output: format!("unsupported jar mode {:?}", other),
                });
            }
        }
        Ok(ToolOutput::default())
    }
}

impl ToolRunner for FakeJdk {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolFailure> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match &invocation.stage {
            ToolStage::Compile { source } => self.compile(invocation, source),
            ToolStage::Package => self.jar(invocation),
        }
    }
}

/// Sorted paths of all files under `dir`, relative and `/`-separated.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}
