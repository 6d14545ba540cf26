//! Connection Provisioner
//!
//! Opens a live, probed connection object for each backend descriptor. The
//! [`Provisioner`] trait is the seam the engine and the request handler are
//! generic over; [`NativeProvisioner`] talks to real databases.

pub mod embedded;
pub mod oracle;
pub mod relational;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::pool::PoolOptions;
use sqlx::sqlite::SqlitePool;

use crate::dsn::DsnBuilder;
use crate::error::{ConnectionError, EngineError};
use crate::models::{EmbeddedConfig, OracleConfig, RelationalConfig};
use crate::platform::{NativePlatform, PlatformAdapter};
use crate::query::buffered::{query_mysql, query_sqlite};
use crate::query::QueryResult;

pub use self::oracle::OracleSource;

/// Pool sizing. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    pub max_idle: Option<u32>,
    pub max_open: Option<u32>,
    pub max_lifetime: Option<Duration>,
    pub max_idle_time: Option<Duration>,
}

impl PoolPolicy {
    /// Oracle source: no caps at all.
    pub const UNBOUNDED: PoolPolicy = PoolPolicy {
        max_idle: None,
        max_open: None,
        max_lifetime: None,
        max_idle_time: None,
    };

    /// MySQL/TiDB target.
    pub const RELATIONAL: PoolPolicy = PoolPolicy {
        max_idle: Some(512),
        max_open: Some(1024),
        max_lifetime: Some(Duration::from_secs(300)),
        max_idle_time: Some(Duration::from_secs(200)),
    };

    /// Applies the policy to a `sqlx` pool. `sqlx` has no idle-count cap, so
    /// `max_idle` is only honored by the Oracle pool as its retained sessions.
    pub fn apply<DB: sqlx::Database>(&self, options: PoolOptions<DB>) -> PoolOptions<DB> {
        let options = options
            .min_connections(0)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.max_idle_time);
        match self.max_open {
            Some(max) => options.max_connections(max),
            None => options,
        }
    }
}

/// A handle whose liveness probe failed, returned together with the error.
/// The caller decides whether to close or drop it.
pub struct Unverified<T> {
    pub handle: T,
    pub error: ConnectionError,
}

impl<T> Unverified<T> {
    pub fn into_parts(self) -> (T, ConnectionError) {
        (self.handle, self.error)
    }
}

impl<T> fmt::Debug for Unverified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unverified").field("error", &self.error).finish_non_exhaustive()
    }
}

/// A live connection object owned by an engine handle.
#[async_trait]
pub trait BackendConnection: Send + Sync + 'static {
    async fn close(&self);
}

/// A connection the generic query executor can run statements on.
#[async_trait]
pub trait QueryConnection: BackendConnection {
    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError>;
}

#[async_trait]
pub trait Provisioner: Send + Sync + 'static {
    type Source: QueryConnection;
    type Target: BackendConnection;
    type Meta: BackendConnection;

    async fn source(&self, cfg: &OracleConfig) -> Result<Self::Source, EngineError>;
    async fn target(&self, cfg: &RelationalConfig) -> Result<Self::Target, EngineError>;
    async fn meta(&self, cfg: &EmbeddedConfig) -> Result<Self::Meta, EngineError>;
}

#[async_trait]
impl BackendConnection for MySqlPool {
    async fn close(&self) {
        sqlx::Pool::close(self).await;
    }
}

#[async_trait]
impl BackendConnection for SqlitePool {
    async fn close(&self) {
        sqlx::Pool::close(self).await;
    }
}

#[async_trait]
impl QueryConnection for MySqlPool {
    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError> {
        Ok(query_mysql(self, sql).await?)
    }
}

#[async_trait]
impl QueryConnection for SqlitePool {
    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError> {
        Ok(query_sqlite(self, sql).await?)
    }
}

/// Provisions real Oracle, MySQL/TiDB and SQLite connections.
#[derive(Clone)]
pub struct NativeProvisioner {
    platform: Arc<dyn PlatformAdapter>,
}

impl NativeProvisioner {
    pub fn new(platform: Arc<dyn PlatformAdapter>) -> Self {
        Self { platform }
    }
}

impl Default for NativeProvisioner {
    fn default() -> Self {
        Self::new(Arc::new(NativePlatform))
    }
}

#[async_trait]
impl Provisioner for NativeProvisioner {
    type Source = OracleSource;
    type Target = MySqlPool;
    type Meta = SqlitePool;

    async fn source(&self, cfg: &OracleConfig) -> Result<OracleSource, EngineError> {
        cfg.validate()?;
        let descriptor = DsnBuilder::new(self.platform.as_ref()).oracle(cfg)?;
        oracle::open(descriptor).await
    }

    async fn target(&self, cfg: &RelationalConfig) -> Result<MySqlPool, EngineError> {
        cfg.validate()?;
        let descriptor = DsnBuilder::new(self.platform.as_ref()).relational(cfg)?;
        relational::open(&descriptor, PoolPolicy::RELATIONAL).await
    }

    async fn meta(&self, cfg: &EmbeddedConfig) -> Result<SqlitePool, EngineError> {
        cfg.validate()?;
        let descriptor = DsnBuilder::new(self.platform.as_ref()).embedded(cfg);
        embedded::open(&descriptor).await
    }
}
