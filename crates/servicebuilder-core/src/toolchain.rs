//! Compiler and archiver invocation.
//!
//! Every external command is described by a [`ToolInvocation`] and executed
//! through a [`ToolRunner`]. [`run_checked`] is the single place where exit
//! status is inspected and mapped onto [`Error`].

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Which pipeline step an invocation belongs to. Decides the error it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStage {
    /// Compiling the named source file.
    Compile { source: String },
    /// Extracting or creating an archive.
    Package,
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    /// Human-readable description used in failure messages.
    pub label: String,
    pub stage: ToolStage,
}

impl ToolInvocation {
    pub fn new(
        program: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        label: impl Into<String>,
        stage: ToolStage,
    ) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            label: label.into(),
            stage,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Arguments as lossy UTF-8, for logging and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why an invocation did not succeed.
#[derive(Debug)]
pub enum ToolFailure {
    /// The process could not be started.
    Spawn(std::io::Error),
    /// The process exited with a non-zero status.
    Exit { code: Option<i32>, output: String },
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start: {}", e),
            Self::Exit { code: Some(code), output } => {
                write!(f, "exit status {}\n{}", code, output)
            }
            Self::Exit { code: None, output } => write!(f, "terminated by signal\n{}", output),
        }
    }
}

/// Executes tool invocations.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> std::result::Result<ToolOutput, ToolFailure>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for std::sync::Arc<T> {
    fn run(&self, invocation: &ToolInvocation) -> std::result::Result<ToolOutput, ToolFailure> {
        (**self).run(invocation)
    }
}

/// Runs invocations as child processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> std::result::Result<ToolOutput, ToolFailure> {
        tracing::debug!(
            command = %invocation,
            cwd = %invocation.working_dir.display(),
            "running"
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .output()
            .map_err(ToolFailure::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !stdout.is_empty() {
            tracing::debug!(stdout = %stdout, "command stdout");
        }
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "command stderr");
        }

        if !output.status.success() {
            let combined = match (stdout.trim(), stderr.trim()) {
                (out, "") => out.to_string(),
                ("", err) => err.to_string(),
                (out, err) => format!("{}\n{}", err, out),
            };
            return Err(ToolFailure::Exit {
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Run an invocation and map failure onto the pipeline's error taxonomy.
pub fn run_checked(runner: &dyn ToolRunner, invocation: &ToolInvocation) -> Result<ToolOutput> {
    runner.run(invocation).map_err(|failure| {
        tracing::warn!(label = %invocation.label, failure = %failure, "tool invocation failed");
        let message = failure.to_string();
        match &invocation.stage {
            ToolStage::Compile { source } => Error::Compilation {
                file: source.clone(),
                message,
            },
            ToolStage::Package => Error::Packaging {
                step: invocation.label.clone(),
                message,
            },
        }
    })
}

/// Compiler and archiver programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub javac: PathBuf,
    pub jar: PathBuf,
}

impl Default for Toolchain {
    /// Bare program names, resolved through `PATH` at spawn time.
    fn default() -> Self {
        Self {
            javac: PathBuf::from("javac"),
            jar: PathBuf::from("jar"),
        }
    }
}

impl Toolchain {
    pub fn new(javac: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            javac: javac.into(),
            jar: jar.into(),
        }
    }

    /// Locate `javac` and `jar`, preferring `$JAVA_HOME/bin` over `PATH`.
    pub fn detect() -> Result<Self> {
        let java_home = std::env::var_os("JAVA_HOME").map(|home| PathBuf::from(home).join("bin"));
        Ok(Self {
            javac: Self::find("javac", java_home.as_deref())?,
            jar: Self::find("jar", java_home.as_deref())?,
        })
    }

    fn find(tool: &str, java_home_bin: Option<&Path>) -> Result<PathBuf> {
        if let Some(bin) = java_home_bin {
            if let Ok(cwd) = std::env::current_dir() {
                if let Ok(path) = which::which_in(tool, Some(bin), cwd) {
                    return Ok(path);
                }
            }
        }
        which::which(tool).map_err(|_| Error::Toolchain(format!("{} not found in PATH", tool)))
    }
}

/// Progress of compiling a request's sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileState {
    Idle,
    /// Compiling the source at this index.
    Compiling(usize),
    /// The source at this index failed; later sources were not attempted.
    Failed(usize),
    AllCompiled,
}

/// Settings shared by every compiler invocation of a request.
#[derive(Debug, Clone)]
pub struct CompileSettings<'a> {
    pub toolchain: &'a Toolchain,
    pub target_version: &'a str,
    pub memory: &'a str,
    /// Runtime archive, relative to the workspace root.
    pub runtime_archive: &'a str,
    /// Helper source compiled alongside every source.
    pub helper_source: &'a str,
}

impl CompileSettings<'_> {
    /// `<runtime archive>:lib/*` with the platform's classpath separator.
    pub fn classpath(&self) -> OsString {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let mut classpath = OsString::from(self.runtime_archive);
        classpath.push(separator);
        classpath.push(format!("{}/*", crate::resources::LIB_DIR));
        classpath
    }

    /// The compiler invocation for one source file.
    pub fn invocation(&self, workspace_root: &Path, source: &str) -> ToolInvocation {
        ToolInvocation::new(
            &self.toolchain.javac,
            workspace_root,
            format!("Compilation of pojo failed: {}", source),
            ToolStage::Compile {
                source: source.to_string(),
            },
        )
        .arg("-target")
        .arg(self.target_version)
        .arg("-source")
        .arg(self.target_version)
        .arg(format!("-J-Xmx{}", self.memory))
        .arg("-cp")
        .arg(self.classpath())
        .arg("-d")
        .arg(crate::workspace::OUT_DIR)
        .arg(source)
        .arg(self.helper_source)
    }
}

/// Compiles sources one at a time, stopping at the first failure.
pub struct Compiler<'a> {
    runner: &'a dyn ToolRunner,
    settings: CompileSettings<'a>,
    state: CompileState,
}

impl<'a> Compiler<'a> {
    pub fn new(runner: &'a dyn ToolRunner, settings: CompileSettings<'a>) -> Self {
        Self {
            runner,
            settings,
            state: CompileState::Idle,
        }
    }

    pub fn state(&self) -> &CompileState {
        &self.state
    }

    /// Compile each source in order into `<workspace_root>/out`.
    pub fn compile_all(&mut self, workspace_root: &Path, sources: &[String]) -> Result<()> {
        for (index, source) in sources.iter().enumerate() {
            self.state = CompileState::Compiling(index);
            tracing::info!(source = %source, "compiling");

            let invocation = self.settings.invocation(workspace_root, source);
            if let Err(e) = run_checked(self.runner, &invocation) {
                self.state = CompileState::Failed(index);
                return Err(e);
            }
        }

        self.state = CompileState::AllCompiled;
        Ok(())
    }
}
