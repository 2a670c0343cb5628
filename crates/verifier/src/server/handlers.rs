//! Axum request handlers for the verifier endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{ErrorResponse, HealthResponse, VerifyRequest, VerifyResponse};
use tracing::warn;

use super::state::AppState;
use crate::process::process_payment;
use crate::verify::RecoverError;

/// `POST /verify` — verify a token and return the recovered card fields.
pub async fn verify(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    match state.verifier.recover(&req.token).await {
        Ok(record) => (
            StatusCode::OK,
            Json(VerifyResponse {
                card_number: record.card_number,
                cvv: record.cvv,
                expiry_date: record.expiry_date,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /process` — verify a token, recover the card data, and run the
/// mocked settlement. The response carries the receipt only.
pub async fn process(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    match state.verifier.recover(&req.token).await {
        Ok(record) => (StatusCode::OK, Json(process_payment(record))).into_response(),
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

/// Map a [`RecoverError`] to its wire representation.
///
/// A rejected token exposes only its verification kind; nothing about the
/// payload ever crosses this boundary.
fn error_response(err: RecoverError) -> Response {
    match err {
        RecoverError::Verification(v) => {
            warn!(kind = v.code(), "token verification failed");
            let status =
                StatusCode::from_u16(v.http_status()).unwrap_or(StatusCode::UNAUTHORIZED);
            (status, Json(ErrorResponse::new(v.code(), v.to_string()))).into_response()
        }
        RecoverError::Corrupt => {
            warn!("recovered plaintext could not be decoded");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal_error", "payload recovery failed")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use axum_test::TestServer;
    use common::protocol::ProcessResponse;
    use serde_json::json;
    use std::sync::Arc;
    use vault::keysvc::{KeyService, MemoryKeyService};
    use vault::record::SensitiveRecord;
    use vault::token::{unix_now, Claims, TokenCodec, TokenParts};

    fn test_server() -> TestServer {
        TestServer::new(router::build(AppState::for_tests())).unwrap()
    }

    /// Mint a token the issuer side would produce, against the same seed as
    /// [`AppState::for_tests`].
    async fn mint_token(issued_at: i64) -> String {
        let keysvc = Arc::new(MemoryKeyService::new(b"handler-tests"));
        let record = SensitiveRecord::new("4111111111111111", "123", "12/30");
        let ciphertext = keysvc
            .encrypt("alias/card-enc", &record.to_plaintext())
            .await
            .unwrap();
        let claims = Claims::new("pay-issuer", "pay-verifier", issued_at, 1800, &ciphertext);
        TokenCodec::new(keysvc as Arc<dyn KeyService>)
            .sign(&claims, "alias/token-sign")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn verify_returns_recovered_fields() {
        let server = test_server();
        let token = mint_token(unix_now()).await;

        let resp = server.post("/verify").json(&json!({ "token": token })).await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: VerifyResponse = resp.json();
        assert_eq!(body.card_number, "4111111111111111");
        assert_eq!(body.cvv, "123");
        assert_eq!(body.expiry_date, "12/30");
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let server = test_server();
        let token = mint_token(unix_now() - 4000).await;

        let resp = server.post("/verify").json(&json!({ "token": token })).await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "expired");
    }

    #[tokio::test]
    async fn tampered_token_is_unauthorized() {
        let server = test_server();
        let token = mint_token(unix_now()).await;

        let mut parts = TokenParts::from_str(&token).unwrap();
        parts.claims[0] ^= 0x01;
        let tampered = parts.to_string_repr();

        let resp = server
            .post("/verify")
            .json(&json!({ "token": tampered }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "bad_signature");
    }

    #[tokio::test]
    async fn garbage_token_is_bad_request() {
        let server = test_server();
        let resp = server
            .post("/verify")
            .json(&json!({ "token": "not-a-token" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "malformed");
    }

    #[tokio::test]
    async fn process_returns_receipt_without_card_data() {
        let server = test_server();
        let token = mint_token(unix_now()).await;

        let resp = server.post("/process").json(&json!({ "token": token })).await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: ProcessResponse = resp.json();
        assert_eq!(body.status, "success");
        assert_eq!(body.message, "Payment processed successfully");
        assert!(!body.receipt_id.is_empty());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let server = test_server();
        let resp = server.get("/health").await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: HealthResponse = resp.json();
        assert_eq!(body.service, "card-token-verifier");
    }
}
