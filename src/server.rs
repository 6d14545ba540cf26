//! HTTP transport for the create-task operation.
//!
//! Every handled request answers `200` with an envelope, success or not.
//! Only malformed requests are rejected by the framework.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::handler::TaskHandler;
use crate::provision::Provisioner;
use crate::task::{CreateTaskRequest, ResponseEnvelope};

pub const CREATE_TASK_PATH: &str = "/api/v1/tasks";
pub const HEALTH_PATH: &str = "/health";

/// Shared application state.
pub struct AppState<P: Provisioner> {
    pub handler: Arc<TaskHandler<P>>,
}

impl<P: Provisioner> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn create_router<P: Provisioner>(handler: Arc<TaskHandler<P>>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(CREATE_TASK_PATH, post(create_task::<P>))
        .with_state(AppState { handler })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn create_task<P: Provisioner>(
    State(state): State<AppState<P>>,
    Json(req): Json<CreateTaskRequest>,
) -> Json<ResponseEnvelope> {
    Json(state.handler.create_task(req).await)
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: tokio::net::TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
