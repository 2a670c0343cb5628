//! Axum request handlers for the issuer endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    ErrorResponse, HealthResponse, IssueRequest, IssueResponse, TokenizeRequest, TokenizeResponse,
};
use tracing::warn;

use super::state::AppState;
use crate::issue::IssueError;

/// `POST /issue` — validate card input and emit a signed bearer token.
pub async fn issue(State(state): State<AppState>, Json(req): Json<IssueRequest>) -> Response {
    match state.issuer.issue(&req).await {
        Ok(token) => (StatusCode::OK, Json(IssueResponse { token })).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /tokenize` — return an opaque reversible reference for the card
/// number alone. No claims, no signature.
pub async fn tokenize(State(state): State<AppState>, Json(req): Json<TokenizeRequest>) -> Response {
    match state.issuer.tokenize(&req).await {
        Ok(token) => (StatusCode::OK, Json(TokenizeResponse { token })).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /health` — liveness check.
pub async fn health() -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        service: crate::SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Map an [`IssueError`] to its wire representation.
///
/// Only classification information crosses this boundary; field contents
/// never appear in responses or logs.
fn error_response(err: IssueError) -> Response {
    match err {
        IssueError::Validation(v) => {
            warn!(fields = v.errors.len(), "payment data validation failed");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::validation(v.errors)),
            )
                .into_response()
        }
        IssueError::KeyService(e) => {
            warn!(cause = %e.cause, "key service failure during issuance");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("key_service_error", e.to_string())),
            )
                .into_response()
        }
        IssueError::Internal(msg) => {
            warn!(error = %msg, "issuance failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal_error", "token issuance failed")),
            )
                .into_response()
        }
    }
}
