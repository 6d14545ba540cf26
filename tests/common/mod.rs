#![allow(dead_code)]

/// Shared fixtures for the integration tests
///
/// `FakeProvisioner` swaps the Oracle source for an in-memory stand-in while
/// the MySQL target and SQLite meta store stay real `sqlx` pools.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orabridge::dsn::DsnBuilder;
use orabridge::models::{EmbeddedConfig, OracleConfig, Password, RelationalConfig};
use orabridge::platform::NativePlatform;
use orabridge::provision::{embedded, relational, BackendConnection, PoolPolicy, Provisioner, QueryConnection};
use orabridge::query::QueryResult;
use orabridge::task::CreateTaskRequest;
use orabridge::EngineError;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::SqlitePool;

/// What the fake source answers to every query.
#[derive(Clone)]
pub enum SourceAnswer {
    Rows(QueryResult),
    Fail(String),
}

/// Counters shared between a provisioner and the sources it hands out.
#[derive(Clone, Default)]
pub struct SourceTracker {
    pub opened: Arc<AtomicUsize>,
    pub queries: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl SourceTracker {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeSource {
    answer: SourceAnswer,
    delay: Option<Duration>,
    tracker: SourceTracker,
}

#[async_trait]
impl BackendConnection for FakeSource {
    async fn close(&self) {
        self.tracker.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueryConnection for FakeSource {
    async fn query(&self, _sql: &str) -> Result<QueryResult, EngineError> {
        self.tracker.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.answer {
            SourceAnswer::Rows(result) => Ok(result.clone()),
            SourceAnswer::Fail(msg) => Err(EngineError::Internal(msg.clone())),
        }
    }
}

pub struct FakeProvisioner {
    pub answer: SourceAnswer,
    pub delay: Option<Duration>,
    /// How long opening the source takes.
    pub open_delay: Option<Duration>,
    pub tracker: SourceTracker,
    /// Dial the target for real instead of handing out a lazy pool.
    pub dial_target: bool,
}

impl FakeProvisioner {
    pub fn answering(answer: SourceAnswer) -> Self {
        Self {
            answer,
            delay: None,
            open_delay: None,
            tracker: SourceTracker::default(),
            dial_target: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub fn dialing_target(mut self) -> Self {
        self.dial_target = true;
        self
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    type Source = FakeSource;
    type Target = MySqlPool;
    type Meta = SqlitePool;

    async fn source(&self, cfg: &OracleConfig) -> Result<FakeSource, EngineError> {
        cfg.validate()?;
        DsnBuilder::new(&NativePlatform).oracle(cfg)?;
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        self.tracker.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSource {
            answer: self.answer.clone(),
            delay: self.delay,
            tracker: self.tracker.clone(),
        })
    }

    async fn target(&self, cfg: &RelationalConfig) -> Result<MySqlPool, EngineError> {
        cfg.validate()?;
        let descriptor = DsnBuilder::new(&NativePlatform).relational(cfg)?;
        if self.dial_target {
            return relational::open(&descriptor, PoolPolicy::RELATIONAL).await;
        }
        let options = MySqlConnectOptions::from_str(&descriptor.address)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        Ok(MySqlPoolOptions::new().connect_lazy_with(options))
    }

    async fn meta(&self, cfg: &EmbeddedConfig) -> Result<SqlitePool, EngineError> {
        cfg.validate()?;
        embedded::open(&DsnBuilder::new(&NativePlatform).embedded(cfg)).await
    }
}

/// Single-row result `{ID: id}`.
pub fn id_row(id: &str) -> QueryResult {
    let mut row = HashMap::new();
    row.insert("ID".to_string(), id.to_string());
    QueryResult {
        columns: vec!["ID".to_string()],
        rows: vec![row],
    }
}

pub fn oracle_config() -> OracleConfig {
    OracleConfig {
        oracle_arch: "noncdb".to_string(),
        username: "marvin".to_string(),
        password: Password::from("marvin"),
        host: "127.0.0.1".to_string(),
        port: 1521,
        service_name: "orclpdb1".to_string(),
        schema_name: "marvin".to_string(),
        ..Default::default()
    }
}

/// MySQL config pointing at `port` on localhost. Port 1 refuses connections.
pub fn mysql_config(port: u16) -> RelationalConfig {
    RelationalConfig {
        db_type: "tidb".to_string(),
        username: "root".to_string(),
        password: Password::from("s3cret!"),
        host: "127.0.0.1".to_string(),
        port,
        connect_params: "charset=utf8mb4".to_string(),
        schema_name: "marvin".to_string(),
    }
}

pub fn request(meta_dir: &Path, mysql_port: u16) -> CreateTaskRequest {
    CreateTaskRequest {
        task_uuid: "2d9f6c1e-7a4b-4f0e-9d55-1f3a8c2b7e01".to_string(),
        task_name: "marvin-sync".to_string(),
        oracle: oracle_config(),
        mysql: mysql_config(mysql_port),
        sqlite: EmbeddedConfig {
            db_path: meta_dir.join("meta").join("marvin.db").display().to_string(),
        },
    }
}
