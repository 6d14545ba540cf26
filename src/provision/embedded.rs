//! SQLite metadata-store provisioning.

use log::LevelFilter;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

use crate::dsn::EmbeddedDescriptor;
use crate::error::{ConnectStage, ConnectionError, EngineError};
use crate::models::Backend;

/// Opens (creating when missing) the database file with the descriptor's
/// fixed options. The parent directory is created as needed.
pub async fn open(descriptor: &EmbeddedDescriptor) -> Result<SqlitePool, EngineError> {
    let address = descriptor.address();

    if let Some(parent) = descriptor.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConnectionError::new(Backend::Sqlite, ConnectStage::Open, &address, e))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&descriptor.path)
        .create_if_missing(true)
        .foreign_keys(descriptor.foreign_keys)
        .statement_cache_capacity(descriptor.statement_cache_capacity)
        .log_slow_statements(LevelFilter::Warn, descriptor.slow_statement_threshold);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| ConnectionError::new(Backend::Sqlite, ConnectStage::Open, &address, e))?;

    log::info!("Opened metadata store: {}", address);
    Ok(pool)
}
