//! MySQL/TiDB target provisioning.

use std::str::FromStr;

use log::LevelFilter;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection};

use super::PoolPolicy;
use crate::dsn::embedded::SLOW_STATEMENT_THRESHOLD;
use crate::dsn::RelationalDescriptor;
use crate::error::{ConnectStage, ConnectionError, DsnParseError, EngineError};
use crate::models::Backend;

/// Dials once, pings, then hands back a lazily-filled pool sized by `policy`.
/// No retries: a refused dial or a failed ping is returned as is.
pub async fn open(descriptor: &RelationalDescriptor, policy: PoolPolicy) -> Result<MySqlPool, EngineError> {
    let address = descriptor.redacted_address();
    let options = MySqlConnectOptions::from_str(&descriptor.address)
        .map_err(|e| DsnParseError::new(Backend::MySql, address.clone(), e.to_string()))?
        .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD);

    log::info!("Attempting to connect to {} database: {}", descriptor.engine, address);
    let mut conn = options
        .connect()
        .await
        .map_err(|e| ConnectionError::new(Backend::MySql, ConnectStage::Open, &address, e))?;

    if let Err(e) = conn.ping().await {
        let _ = conn.close().await;
        return Err(ConnectionError::new(Backend::MySql, ConnectStage::Ping, &address, e).into());
    }
    if let Err(e) = conn.close().await {
        log::debug!("Closing probe connection to {} failed: {}", address, e);
    }

    log::info!("Successfully connected to {}", address);
    Ok(policy.apply(MySqlPoolOptions::new()).connect_lazy_with(options))
}
