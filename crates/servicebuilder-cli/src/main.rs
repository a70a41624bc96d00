//! Scoring service builder CLI.

mod build;
mod colors;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use servicebuilder_core::{BuilderConfig, ResourcePack, Toolchain, WorkspaceConfig};
use servicebuilder_core::config::{DEFAULT_JAVA_MEMORY, DEFAULT_JAVA_TARGET_VERSION};

#[derive(Parser)]
#[command(name = "servicebuilder")]
#[command(about = "Compile scoring POJOs into a deployable jar")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Settings shared by every command that runs the pipeline.
#[derive(Args)]
struct PipelineArgs {
    /// Resource pack root (contains extra/H2OPredictor.java, extra/MANIFEST.txt, extra/WEB-INF/lib)
    #[arg(long, env = "SERVICEBUILDER_RESOURCES")]
    resources: PathBuf,

    /// Java language level for -source and -target
    #[arg(long, default_value = DEFAULT_JAVA_TARGET_VERSION)]
    java_target: String,

    /// Maximum heap for the compiler process
    #[arg(long, default_value = DEFAULT_JAVA_MEMORY)]
    java_memory: String,

    /// Path to javac (default: $JAVA_HOME/bin, then PATH)
    #[arg(long)]
    javac: Option<PathBuf>,

    /// Path to jar (default: $JAVA_HOME/bin, then PATH)
    #[arg(long)]
    jar: Option<PathBuf>,

    /// Directory for per-build workspaces (default: system temp dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Keep workspaces after each build for debugging
    #[arg(long)]
    keep_workspaces: bool,
}

impl PipelineArgs {
    fn builder_config(&self) -> anyhow::Result<BuilderConfig> {
        let resources = ResourcePack::new(&self.resources);
        resources
            .validate()
            .with_context(|| format!("Invalid resource pack: {}", self.resources.display()))?;

        let toolchain = match (&self.javac, &self.jar) {
            (Some(javac), Some(jar)) => Toolchain::new(javac, jar),
            (javac, jar) => {
                let detected = Toolchain::detect().context("Could not locate a JDK")?;
                Toolchain::new(
                    javac.clone().unwrap_or(detected.javac),
                    jar.clone().unwrap_or(detected.jar),
                )
            }
        };

        let mut workspace = WorkspaceConfig {
            keep: self.keep_workspaces,
            ..Default::default()
        };
        if let Some(temp_dir) = &self.temp_dir {
            workspace.temp_root = temp_dir.clone();
        }

        Ok(BuilderConfig {
            resources,
            toolchain,
            java_target_version: self.java_target.clone(),
            java_memory: self.java_memory.clone(),
            workspace,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the compile server
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "55000")]
        port: u16,

        /// Largest accepted upload, in megabytes
        #[arg(long, default_value = "512")]
        max_upload_mb: usize,
    },

    /// Compile POJOs locally into a jar
    Build {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Runtime archive (h2o-genmodel.jar)
        #[arg(short = 'g', long)]
        genmodel: PathBuf,

        /// Output path for the result jar
        #[arg(short, long, default_value = "result.jar")]
        output: PathBuf,

        /// POJO source files
        #[arg(required = true)]
        pojos: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve {
            pipeline,
            host,
            port,
            max_upload_mb,
        } => {
            let config = pipeline.builder_config()?;
            serve::execute(config, host, port, max_upload_mb).await?;
        }

        Commands::Build {
            pipeline,
            genmodel,
            output,
            pojos,
        } => {
            // Validate inputs before touching the JDK
            build::check_inputs(&pojos, &genmodel)?;
            let config = pipeline.builder_config()?;
            build::execute(config, &pojos, &genmodel, &output)?;
        }
    }

    Ok(())
}
