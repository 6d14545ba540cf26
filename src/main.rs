//! orabridge server entry point
//!
//! Serves the create-task operation over HTTP. Core functionality is
//! provided by the `orabridge` library crate.

use std::sync::Arc;

use clap::Parser;
use orabridge::{
    config::{ServiceConfig, DEFAULT_BIND, DEFAULT_LOG_FILTER, DEFAULT_PORT},
    handler::{TaskHandler, ValidationQuery, DEFAULT_VALIDATION_COLUMN, DEFAULT_VALIDATION_SQL},
    provision::NativeProvisioner,
    server::{create_router, serve},
};

/// orabridge - Oracle / MySQL / SQLite connection broker
#[derive(Parser, Debug)]
#[command(name = "orabridge", version, about, long_about = None)]
struct Cli {
    /// Server bind address
    #[arg(long, default_value = DEFAULT_BIND, env = "ORABRIDGE_BIND")]
    bind: String,

    /// Server port
    #[arg(long, default_value_t = DEFAULT_PORT, env = "ORABRIDGE_PORT")]
    port: u16,

    /// Query run against the source to validate a task
    #[arg(long, default_value = DEFAULT_VALIDATION_SQL, env = "ORABRIDGE_VALIDATION_QUERY")]
    validation_query: String,

    /// Column of the validation query returned as the task message
    #[arg(long, default_value = DEFAULT_VALIDATION_COLUMN, env = "ORABRIDGE_VALIDATION_COLUMN")]
    validation_column: String,

    /// Deadline for one create-task call in seconds (0 disables it)
    #[arg(long, default_value_t = 30, env = "ORABRIDGE_REQUEST_TIMEOUT")]
    request_timeout: u64,

    /// Log filter, e.g. "info" or "info,sqlx=warn"
    #[arg(long, default_value = DEFAULT_LOG_FILTER, env = "ORABRIDGE_LOG")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            bind: self.bind,
            port: self.port,
            validation: ValidationQuery {
                sql: self.validation_query,
                column: self.validation_column,
            },
            request_timeout: ServiceConfig::timeout_from_secs(self.request_timeout),
            log_filter: self.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();
    orabridge::logging::init(&config.log_filter);

    log::info!("orabridge - Oracle / MySQL / SQLite connection broker");
    config.validate()?;
    let addr = config.socket_addr()?;

    let provisioner = Arc::new(NativeProvisioner::default());
    let handler = TaskHandler::new(provisioner, config.validation.clone())
        .with_timeout(config.request_timeout);
    let app = create_router(Arc::new(handler));

    log::info!(
        "Validation query: [{}] column [{}], request timeout {:?}",
        config.validation.sql,
        config.validation.column,
        config.request_timeout
    );
    log::info!("Web server listening on: http://{}", addr);
    log::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, app, shutdown_signal()).await?;

    log::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            log::info!("Received terminate signal");
        }
    }
}
