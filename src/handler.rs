//! Request Handler
//!
//! One create-task call: build the engine handle, run the validation query
//! against the source once, close the handle, answer with an envelope.
//! Every failure becomes a nonzero envelope carrying the error text. An
//! opened handle is always closed, including when the deadline fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::EngineHandle;
use crate::error::EngineError;
use crate::provision::{Provisioner, QueryConnection};
use crate::task::{CreateTaskRequest, ResponseEnvelope, TaskInfo};

pub const DEFAULT_VALIDATION_SQL: &str = "SELECT ID FROM MARVIN.MARVIN WHERE ROWNUM = 1";
pub const DEFAULT_VALIDATION_COLUMN: &str = "ID";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Statement run against the source and the column whose first-row value
/// becomes the success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationQuery {
    pub sql: String,
    pub column: String,
}

impl Default for ValidationQuery {
    fn default() -> Self {
        Self {
            sql: DEFAULT_VALIDATION_SQL.to_string(),
            column: DEFAULT_VALIDATION_COLUMN.to_string(),
        }
    }
}

pub struct TaskHandler<P: Provisioner> {
    provisioner: Arc<P>,
    validation: ValidationQuery,
    timeout: Option<Duration>,
}

impl<P: Provisioner> TaskHandler<P> {
    pub fn new(provisioner: Arc<P>, validation: ValidationQuery) -> Self {
        Self {
            provisioner,
            validation,
            timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Deadline for the whole request; `None` disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validation(&self) -> &ValidationQuery {
        &self.validation
    }

    pub async fn create_task(&self, req: CreateTaskRequest) -> ResponseEnvelope {
        let task = TaskInfo::from(&req);
        log::info!("Create task [{}] {}", task.task_uuid, task.task_name);

        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));
        let outcome = self.run(&req, deadline).await;

        match outcome {
            Ok(value) => {
                log::info!("Task [{}] validated, value: {}", task.task_uuid, value);
                ResponseEnvelope::success(task, value)
            }
            Err(e) => {
                log::error!("Task [{}] failed: {}", task.task_uuid, e);
                ResponseEnvelope::failure(task, e)
            }
        }
    }

    async fn run(
        &self,
        req: &CreateTaskRequest,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<String, EngineError> {
        let engine = self.open(req, deadline).await?;
        let outcome = match deadline {
            Some((at, limit)) => tokio::time::timeout_at(at, self.validate(&engine))
                .await
                .unwrap_or(Err(EngineError::Timeout(limit))),
            None => self.validate(&engine).await,
        };
        engine.close().await;
        outcome
    }

    /// Provisions the engine handle on its own task. When the deadline fires
    /// first, the task is left to finish and closes whatever it opened.
    async fn open(
        &self,
        req: &CreateTaskRequest,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<EngineHandle<P>, EngineError> {
        let provisioner = Arc::clone(&self.provisioner);
        let (oracle, mysql, sqlite) = (req.oracle.clone(), req.mysql.clone(), req.sqlite.clone());
        let mut opening = tokio::spawn(async move {
            EngineHandle::open(provisioner.as_ref(), &oracle, &mysql, &sqlite).await
        });

        let Some((at, limit)) = deadline else {
            return opening.await?;
        };
        match tokio::time::timeout_at(at, &mut opening).await {
            Ok(joined) => joined?,
            Err(_) => {
                tokio::spawn(async move {
                    if let Ok(Ok(engine)) = opening.await {
                        log::warn!("Closing engine handle that opened after the deadline");
                        engine.close().await;
                    }
                });
                Err(EngineError::Timeout(limit))
            }
        }
    }

    async fn validate(&self, engine: &EngineHandle<P>) -> Result<String, EngineError> {
        let result = engine.source().query(&self.validation.sql).await?;
        result
            .first_value(&self.validation.column)
            .map(str::to_string)
            .ok_or_else(|| EngineError::Validation {
                sql: self.validation.sql.clone(),
                column: self.validation.column.clone(),
            })
    }
}
