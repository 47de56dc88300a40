// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use briefpress_pipeline::AppState;
use tracing::debug;

/// API-key middleware. With no key configured the service runs in stub mode
/// and lets everything through; with a key, both the `X-Api-Key` header and
/// a bearer token are accepted.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.http.api_key.as_deref() else {
        debug!(target: "auth", "no API key configured, allowing request (stub mode)");
        return next.run(request).await;
    };

    if let Some(api_key) = headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) {
        if api_key == expected {
            debug!(target: "auth", "API key authentication accepted");
            return next.run(request).await;
        }
    }

    if let Some(auth_str) = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
    {
        if auth_str.strip_prefix("Bearer ") == Some(expected) {
            debug!(target: "auth", "bearer token authentication accepted");
            return next.run(request).await;
        }
    }

    debug!(target: "auth", "rejecting unauthenticated request");
    unauthorized().await.into_response()
}

/// Response for unauthorized requests
pub async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "Unauthorized")
}
