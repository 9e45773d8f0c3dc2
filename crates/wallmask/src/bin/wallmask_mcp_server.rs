//cargo run --package wallmask --bin wallmask_mcp_server
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};
use wallmask::{config::SimulatorConfig, mcp::WallMaskMcpServer};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
        .init();

    let config = match std::env::var("WALLMASK_CONFIG") {
        Ok(path) => {
            tracing::info!(%path, "Loading simulator config");
            SimulatorConfig::from_file(&path)?
        }
        Err(_) => SimulatorConfig::default(),
    };

    tracing::info!("Starting wall detection MCP server");
    let server = WallMaskMcpServer::with_config(config);

    let service = match server.serve(stdio()).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start MCP server: {:?}", e);
            return Err(e.into());
        }
    };
    tracing::info!("MCP server started, listening on stdio");

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => tracing::info!("MCP server completed successfully"),
                Err(e) => {
                    tracing::error!("MCP server error: {:?}", e);
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        }
    }

    tracing::info!("MCP server shut down");
    Ok(())
}
