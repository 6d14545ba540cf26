//! Service configuration for the `orabridge` server binary.
//!
//! Backend configurations arrive per request; this only covers how the
//! service itself runs.

use std::net::SocketAddr;
use std::time::Duration;

use crate::handler::{ValidationQuery, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8900;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub validation: ValidationQuery,
    /// Deadline for a whole create-task call; `None` disables it.
    pub request_timeout: Option<Duration>,
    /// `env_logger` filter string, e.g. `info,sqlx=warn`.
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            validation: ValidationQuery::default(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.trim().is_empty() {
            return Err("bind address cannot be empty".to_string());
        }
        if self.validation.sql.trim().is_empty() {
            return Err("validation query cannot be empty".to_string());
        }
        if self.validation.column.trim().is_empty() {
            return Err("validation column cannot be empty".to_string());
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| format!("invalid bind address {}:{}: {}", self.bind, self.port, e))
    }

    /// Zero seconds disables the request deadline.
    pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}
