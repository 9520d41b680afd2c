//! Route handlers, grouped by resource.

pub mod plugins;
pub mod selection;
pub mod strips;
pub mod transport;

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use mixbridge_core::Error;

use crate::{
    models::{ErrorResponse, Health, ServiceInfo},
    AppState,
};

/// One rejection type used across routes.
pub type Rejection = (StatusCode, Json<ErrorResponse>);

/// Map the core error taxonomy onto status codes.
pub fn reject(err: Error) -> Rejection {
    match err {
        Error::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(&err.to_string())),
        ),
        Error::NoStripSelected => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(&err.to_string())),
        ),
        Error::InvalidValue(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::invalid_value(&err.to_string())),
        ),
        Error::Socket(_) | Error::OscEncode(_) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::send_failed(&err.to_string())),
        ),
    }
}

/// Run a blocking core operation off the async executor.
pub async fn blocking<T, F>(f: F) -> Result<T, Rejection>
where
    T: Send + 'static,
    F: FnOnce() -> mixbridge_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(&format!("task panicked: {}", e))),
            )
        })?
        .map_err(reject)
}

/// GET / - Service banner
pub async fn service_banner(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: state.config.osc.target.clone(),
        listen_port: state.config.osc.listen_port,
    })
}

/// GET /health - Liveness and feedback state
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        strips_known: state.store.has_strips(),
        enumeration_complete: state.store.enumeration_complete(),
    })
}
