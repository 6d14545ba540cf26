//! SQLite metadata-store descriptor.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::EmbeddedConfig;

/// Statements slower than this are logged at `warn`.
pub const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_millis(300);

/// Prepared statements kept per connection.
pub const STATEMENT_CACHE_CAPACITY: usize = 100;

/// Table naming for the metadata store. Tables are named after the
/// singular entity name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingStrategy {
    pub singular_table: bool,
}

#[derive(Debug, Clone)]
pub struct EmbeddedDescriptor {
    pub path: PathBuf,
    pub foreign_keys: bool,
    pub statement_cache_capacity: usize,
    pub naming: NamingStrategy,
    pub slow_statement_threshold: Duration,
}

impl EmbeddedDescriptor {
    pub fn address(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

pub(super) fn build(cfg: &EmbeddedConfig) -> EmbeddedDescriptor {
    EmbeddedDescriptor {
        path: PathBuf::from(cfg.db_path.trim()),
        foreign_keys: false,
        statement_cache_capacity: STATEMENT_CACHE_CAPACITY,
        naming: NamingStrategy {
            singular_table: true,
        },
        slow_statement_threshold: SLOW_STATEMENT_THRESHOLD,
    }
}
