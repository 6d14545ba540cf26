//! Error taxonomy for DSN construction, provisioning and query execution.
//!
//! Every error carries enough context (the redacted address or the query
//! text) to be surfaced verbatim at the request boundary. Nothing here is
//! retried or masked.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::models::Backend;

/// Boxed driver error used as the `source` of wrapped errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed connection address or parameter string.
#[derive(Debug, Error)]
#[error("parse {backend} dsn [{address}] failed: {reason}")]
pub struct DsnParseError {
    pub backend: Backend,
    /// Offending address with the password masked.
    pub address: String,
    pub reason: String,
}

impl DsnParseError {
    pub fn new(backend: Backend, address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend,
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Step of connection provisioning that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStage {
    Open,
    Ping,
}

impl fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectStage::Open => f.write_str("open"),
            ConnectStage::Ping => f.write_str("ping"),
        }
    }
}

/// Dial or liveness-probe failure for one backend.
#[derive(Debug, Error)]
#[error("error on {stage} {backend} database connection [{address}]: {source}")]
pub struct ConnectionError {
    pub backend: Backend,
    pub stage: ConnectStage,
    pub address: String,
    #[source]
    pub source: BoxError,
}

impl ConnectionError {
    pub fn new(
        backend: Backend,
        stage: ConnectStage,
        address: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            backend,
            stage,
            address: address.into(),
            source: source.into(),
        }
    }
}

/// Step of the generic query routine that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Execute,
    Columns,
    Scan,
    Next,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStage::Execute => f.write_str("query"),
            QueryStage::Columns => f.write_str("query columns"),
            QueryStage::Scan => f.write_str("query rows scan"),
            QueryStage::Next => f.write_str("query rows next"),
        }
    }
}

/// Execution or scan failure. Partial results are never attached.
#[derive(Debug, Error)]
#[error("general sql [{sql}] {stage} failed: [{source}]")]
pub struct QueryError {
    pub sql: String,
    pub stage: QueryStage,
    #[source]
    pub source: BoxError,
}

impl QueryError {
    pub fn new(sql: impl Into<String>, stage: QueryStage, source: impl Into<BoxError>) -> Self {
        Self {
            sql: sql.into(),
            stage,
            source: source.into(),
        }
    }
}

/// Native client library wiring failures.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("set {var} env failed: {reason}")]
    SetEnv { var: &'static str, reason: String },

    #[error("oracle client library dir already set to [{current}], cannot switch to [{requested}]")]
    LibDirConflict { current: String, requested: String },

    #[error("oracle client library not found at: {0}")]
    LibraryNotFound(String),

    #[error("failed to load oracle client library: {0}")]
    LibraryLoad(String),
}

/// Top-level error of the engine. The request handler turns any of these
/// into a failure envelope carrying `to_string()`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {backend} config: {reason}")]
    InvalidConfig { backend: Backend, reason: String },

    #[error(transparent)]
    Dsn(#[from] DsnParseError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("validation sql [{sql}] returned no value for column [{column}]")]
    Validation { sql: String, column: String },

    #[error("create task deadline exceeded after {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_config(backend: Backend, reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            backend,
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Internal(format!("background task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_text_carries_address_and_cause() {
        let err = ConnectionError::new(
            Backend::MySql,
            ConnectStage::Ping,
            "mysql://root:xxxxx@h:4000/marvin",
            "connection reset",
        );
        assert_eq!(
            err.to_string(),
            "error on ping mysql database connection [mysql://root:xxxxx@h:4000/marvin]: connection reset"
        );
    }

    #[test]
    fn test_engine_error_is_transparent_for_wrapped_errors() {
        let err: EngineError = QueryError::new("SELECT 1", QueryStage::Execute, "boom").into();
        assert_eq!(err.to_string(), "general sql [SELECT 1] query failed: [boom]");

        let err: EngineError = DsnParseError::new(Backend::Oracle, "oracle://@h:1/s", "bad").into();
        assert_eq!(err.to_string(), "parse oracle dsn [oracle://@h:1/s] failed: bad");
    }
}
