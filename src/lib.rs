//! orabridge: connection broker for one Oracle source, one MySQL/TiDB
//! target and one embedded SQLite metadata store.
//!
//! A create-task request carries the three backend configurations. The
//! broker derives a connection descriptor per backend, opens and verifies
//! each handle, runs a validation query against the source and answers
//! with a response envelope.

pub mod client;
pub mod config;
pub mod dsn;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod platform;
pub mod provision;
pub mod query;
pub mod sanitize;
pub mod server;
pub mod task;

pub use dsn::{ConnectionDescriptor, DsnBuilder};
pub use engine::EngineHandle;
pub use error::{EngineError, QueryError};
pub use handler::{TaskHandler, ValidationQuery};
pub use models::{Backend, BackendConfig, EmbeddedConfig, OracleConfig, RelationalConfig};
pub use provision::{NativeProvisioner, Provisioner};
pub use query::{QueryResult, NULL_SENTINEL};
pub use task::{CreateTaskRequest, ResponseEnvelope};
