use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::server::CREATE_TASK_PATH;
use crate::task::{CreateTaskRequest, ResponseEnvelope};

pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("create task failed: HTTP {0}")]
  Status(StatusCode),
}

/// Client for a running `orabridge` server.
#[derive(Debug, Clone)]
pub struct TaskClient {
  http: Client,
  base_url: String,
}

impl TaskClient {
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    let http = Client::builder().timeout(CLIENT_TIMEOUT).build()?;
    Ok(Self::with_client(http, base_url))
  }

  pub fn with_client(http: Client, base_url: &str) -> Self {
    Self { http, base_url: base_url.trim_end_matches('/').to_string() }
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  /// Posts the request and returns the envelope. A failure envelope is a
  /// successful call; only transport errors and non-2xx statuses are `Err`.
  pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<ResponseEnvelope, ClientError> {
    let url = format!("{}{}", self.base_url, CREATE_TASK_PATH);
    log::debug!("POST {} task [{}]", url, req.task_uuid);
    let res = self.http.post(&url).json(req).send().await?;
    if !res.status().is_success() { return Err(ClientError::Status(res.status())); }
    Ok(res.json::<ResponseEnvelope>().await?)
  }
}
