//! Serve command implementation.

use servicebuilder_core::BuilderConfig;
use servicebuilder_server::ServerConfig;

use crate::colors;

/// Start the compile server.
pub async fn execute(
    config: BuilderConfig,
    host: String,
    port: u16,
    max_upload_mb: usize,
) -> anyhow::Result<()> {
    let server_config = ServerConfig {
        host,
        port,
        max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
    };

    println!(
        "\n{}Scoring Service Builder{}",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));
    if let Ok(root) = config.resources.root() {
        println!("{}  ◆ Resources:{} {}", colors::CYAN, colors::RESET, root.display());
    }
    println!(
        "{}  ◆ javac:{} {}",
        colors::CYAN,
        colors::RESET,
        config.toolchain.javac.display()
    );
    println!(
        "{}  ◆ Endpoint:{} http://{}:{}/compile",
        colors::CYAN,
        colors::RESET,
        server_config.host,
        server_config.port
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    servicebuilder_server::serve(config, server_config).await?;

    Ok(())
}
