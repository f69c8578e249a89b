//! Video proxy
//!
//! Streams avatar video bytes from the upstream provider URL with
//! permissive CORS headers. Clients only ever receive this same-origin
//! indirection; the raw provider URL stays server-side, which keeps the
//! browser's cross-origin restrictions satisfied.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::ServerError;

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: String,
}

/// `GET /api/video_proxy?url=<upstream>`
pub async fn video_proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, ServerError> {
    validate_proxy_url(&params.url).map_err(|e| {
        tracing::warn!(url = %params.url, error = %e, "Rejected proxy URL");
        ServerError::InvalidRequest(e)
    })?;

    let upstream = state.http.get(&params.url).send().await.map_err(|e| {
        tracing::warn!(error = %e, "Upstream video fetch failed");
        ServerError::Proxy(e.to_string())
    })?;

    if !upstream.status().is_success() {
        tracing::warn!(status = %upstream.status(), "Upstream returned non-success");
        return Err(ServerError::Proxy(format!(
            "Upstream HTTP {}",
            upstream.status()
        )));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("video/mp4")
        .to_string();

    let body = Body::from_stream(upstream.bytes_stream());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::CACHE_CONTROL, "no-store")
        .body(body)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// Only plain http(s) URLs are forwarded
pub fn validate_proxy_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported scheme: {other}")),
    }
}
