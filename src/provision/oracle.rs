//! Async wrapper around the blocking Oracle pool.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{BackendConnection, QueryConnection};
use crate::dsn::OracleDescriptor;
use crate::error::EngineError;
use crate::oracle::OraclePool;
use crate::query::QueryResult;

#[derive(Clone)]
pub struct OracleSource {
    pool: Arc<OraclePool>,
}

impl fmt::Debug for OracleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSource")
            .field("address", &self.pool.address())
            .finish_non_exhaustive()
    }
}

impl OracleSource {
    pub fn new(pool: OraclePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &OraclePool {
        &self.pool
    }
}

#[async_trait]
impl BackendConnection for OracleSource {
    async fn close(&self) {
        let pool = Arc::clone(&self.pool);
        if let Err(e) = tokio::task::spawn_blocking(move || pool.close()).await {
            log::warn!("Closing oracle pool failed: {}", e);
        }
    }
}

#[async_trait]
impl QueryConnection for OracleSource {
    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError> {
        let pool = Arc::clone(&self.pool);
        let sql = sql.to_string();
        Ok(tokio::task::spawn_blocking(move || pool.query(&sql)).await??)
    }
}

/// Provisions the source pool on the blocking thread pool. A pool that was
/// created but failed its first session is closed before the error returns.
pub async fn open(descriptor: OracleDescriptor) -> Result<OracleSource, EngineError> {
    let provisioned = tokio::task::spawn_blocking(move || {
        crate::oracle::provision(&descriptor).map_err(|failure| failure.close())
    })
    .await?;
    Ok(OracleSource::new(provisioned?))
}
