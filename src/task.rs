/// Create-task request and response envelope
///
/// Field names follow the JSON wire format used by the task clients.

use serde::{Deserialize, Serialize};

use crate::models::{EmbeddedConfig, OracleConfig, RelationalConfig};

pub const RESP_CODE_SUCCESS: i32 = 0;
pub const RESP_CODE_FAILURE: i32 = 1;

/// Request carrying all three backend configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskRequest {
    #[serde(rename = "taskUUID")]
    pub task_uuid: String,

    pub task_name: String,

    #[serde(rename = "oracleDBEngine")]
    pub oracle: OracleConfig,

    #[serde(rename = "mySQLDBEngine")]
    pub mysql: RelationalConfig,

    #[serde(rename = "sqliteDBEngine")]
    pub sqlite: EmbeddedConfig,
}

/// Task identity echoed back in every response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(rename = "taskUUID")]
    pub task_uuid: String,
    pub task_name: String,
}

impl From<&CreateTaskRequest> for TaskInfo {
    fn from(req: &CreateTaskRequest) -> Self {
        Self {
            task_uuid: req.task_uuid.clone(),
            task_name: req.task_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespMsg {
    pub resp_code: i32,
    pub resp_msg: String,
}

/// Result of a create-task call. Code 0 carries the validation value,
/// any other code carries the error text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub task_info: TaskInfo,
    pub resp_msg: RespMsg,
}

impl ResponseEnvelope {
    pub fn success(task_info: TaskInfo, value: impl Into<String>) -> Self {
        Self {
            task_info,
            resp_msg: RespMsg {
                resp_code: RESP_CODE_SUCCESS,
                resp_msg: value.into(),
            },
        }
    }

    pub fn failure(task_info: TaskInfo, error: impl std::fmt::Display) -> Self {
        Self {
            task_info,
            resp_msg: RespMsg {
                resp_code: RESP_CODE_FAILURE,
                resp_msg: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.resp_msg.resp_code == RESP_CODE_SUCCESS
    }
}
