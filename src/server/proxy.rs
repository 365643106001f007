//! `/api/proxy/{*path}`: forwards any request to the backend service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::debug;

use super::ServerState;
use super::error::HandlerError;

pub async fn forward(
    State(state): State<Arc<ServerState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    body: Bytes,
) -> Result<Response, HandlerError> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(HandlerError::BadRequest("Path is required"));
    }
    let mut url = format!("{}/{}", state.backend_url, path);
    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }
    debug!("Proxy {} {}", method, url);

    let mut request = state
        .http
        .request(method.clone(), &url)
        .header(header::CONTENT_TYPE, "application/json");
    if method != Method::GET && method != Method::HEAD {
        request = request.body(body);
    }
    let upstream = request
        .send()
        .await
        .map_err(|e| HandlerError::internal("Error connecting to backend service", e))?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok());
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| HandlerError::internal("Error connecting to backend service", e))?;

    let mut response = (status, bytes).into_response();
    match content_type {
        Some(ct) => {
            response.headers_mut().insert(header::CONTENT_TYPE, ct);
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }
    Ok(response)
}

/// `/api/proxy` with nothing to forward to.
pub async fn missing_path() -> HandlerError {
    HandlerError::BadRequest("Path is required")
}
