//! Video Agent Server
//!
//! Provides the WebSocket relay channel and HTTP endpoints (uploads,
//! video proxy, health, metrics) around the orchestration core.

pub mod http;
pub mod metrics;
pub mod proxy;
pub mod state;
pub mod uploads;
pub mod ws;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Upload(_) => StatusCode::BAD_REQUEST,
            ServerError::Proxy(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
