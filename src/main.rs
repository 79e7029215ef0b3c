//! AlloyDB Survey MCP Server entry point.
//!
//! This binary starts the MCP server using stdio transport for integration
//! with Claude Desktop, Cursor, and other MCP clients.
//!
//! Features:
//! - Optional `.env` loading
//! - Signal handling (SIGTERM, SIGHUP, Ctrl+C)
//! - Graceful shutdown with connection draining

use alloydb_survey_mcp_server::shutdown::{
    install_signal_handlers, new_shutdown_controller_with_timeouts, ShutdownConfig,
};
use alloydb_survey_mcp_server::{Config, SurveyMcpServer};
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    // Configuration errors are fatal, but logging needs the configured level
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(None);
            error!("{}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    init_logging(Some(&config.server.log_level));

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    info!(
        "{} v{} starting (transport: stdio)",
        config.server.name, config.server.version
    );
    info!("Target instance: {}", config.database.instance_connection_name());

    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] {}", info);
    }));

    let shutdown_config = ShutdownConfig::from_env();
    let shutdown_controller = new_shutdown_controller_with_timeouts(
        shutdown_config.drain_timeout,
        shutdown_config.force_timeout,
    );
    install_signal_handlers(shutdown_controller.clone()).await;

    let server = SurveyMcpServer::new(config)
        .await
        .context("Failed to connect to AlloyDB")?;
    let pool = server.pool().clone();
    info!("Server initialized. Ready to accept requests...");

    let transport = rmcp::transport::stdio();
    let service = server
        .serve(transport)
        .await
        .context("Failed to start MCP service")?;

    let mut shutdown_signal = shutdown_controller.signal();

    tokio::select! {
        quit_reason = service.waiting() => {
            match quit_reason {
                Ok(reason) => info!("Service stopped: {:?}", reason),
                Err(e) => error!("Service error: {}", e),
            }
        }
        _ = shutdown_signal.recv() => {
            info!("Shutdown signal received");
        }
    }

    shutdown_controller.graceful_shutdown(&pool).await;
    info!("Server shutdown complete");

    Ok(())
}

/// Initialize tracing subscriber with stderr output.
///
/// Logs MUST go to stderr because stdout is used for JSON-RPC communication.
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level: Option<&str>) {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| {
            let level = level.unwrap_or(alloydb_survey_mcp_server::constants::DEFAULT_LOG_LEVEL);
            EnvFilter::new(format!("warn,alloydb_survey_mcp_server={}", level))
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
