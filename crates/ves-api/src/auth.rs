//! # Authentication Middleware
//!
//! Single static bearer token, compared constant-time against the value
//! of `VES_API_TOKEN`. Every `/api/v1/*` route sits behind this
//! middleware; health probes and the OpenAPI document do not.
//!
//! ## Security Invariant
//!
//! Token comparison never short-circuits on content. When lengths differ
//! a dummy comparison runs so the reject path costs the same either way,
//! and the expected token never appears in logs or `Debug` output.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// The operator token requests must present, injected into request
/// extensions at router assembly.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Constant-time acceptance check.
    ///
    /// `ConstantTimeEq` only covers equal-length slices, so a length
    /// mismatch runs a self-comparison of the expected token to keep the
    /// reject path's cost flat.
    fn accepts(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if presented.len() != expected.len() {
            let _ = expected.ct_eq(expected);
            return false;
        }
        presented.ct_eq(expected).into()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

/// What the Authorization header carried, with all borrows of the
/// request released before the middleware decides.
enum Presented {
    Token(String),
    WrongScheme,
    Missing,
}

fn presented_token(request: &Request) -> Presented {
    match request.headers().get(header::AUTHORIZATION) {
        None => Presented::Missing,
        Some(value) => match value
            .to_str()
            .ok()
            .and_then(|text| text.strip_prefix("Bearer "))
        {
            Some(token) => Presented::Token(token.to_string()),
            None => Presented::WrongScheme,
        },
    }
}

/// Reject any request not carrying `Authorization: Bearer <token>` with
/// the configured operator token.
///
/// Fails closed: a stack assembled without a [`BearerToken`] extension
/// rejects every request rather than letting traffic through unchecked.
/// Rejections flow through [`AppError::Unauthorized`], which logs the
/// reason and renders the standard error body.
pub async fn require_bearer(request: Request, next: Next) -> Response {
    let Some(expected) = request.extensions().get::<BearerToken>().cloned() else {
        tracing::error!("auth middleware running without a BearerToken extension");
        return reject("authentication is not configured");
    };

    match presented_token(&request) {
        Presented::Token(token) if expected.accepts(&token) => next.run(request).await,
        Presented::Token(_) => reject("invalid bearer token"),
        Presented::WrongScheme => reject("authorization header must use Bearer scheme"),
        Presented::Missing => reject("missing authorization header"),
    }
}

fn reject(reason: &str) -> Response {
    AppError::Unauthorized(reason.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "op-token-7f3a";

    fn guarded_app() -> Router {
        Router::new()
            .route("/guarded", get(|| async { "through" }))
            .layer(from_fn(require_bearer))
            .layer(axum::Extension(BearerToken::new(SECRET.to_string())))
    }

    async fn send(app: Router, authorization: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri("/guarded");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::json!(String::from_utf8_lossy(&bytes)));
        (status, body)
    }

    #[tokio::test]
    async fn correct_token_passes_through() {
        let (status, body) = send(guarded_app(), Some(&format!("Bearer {SECRET}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "through");
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_with_error_body() {
        let (status, body) = send(guarded_app(), Some("Bearer op-token-0000")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("invalid bearer token"));
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (status, body) = send(guarded_app(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("missing authorization header"));
    }

    #[tokio::test]
    async fn basic_scheme_is_rejected() {
        let (status, body) = send(guarded_app(), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn stack_without_token_extension_fails_closed() {
        let app = Router::new()
            .route("/guarded", get(|| async { "through" }))
            .layer(from_fn(require_bearer));
        let (status, _) = send(app, Some(&format!("Bearer {SECRET}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn accepts_exact_match_only() {
        let token = BearerToken::new(SECRET.to_string());
        assert!(token.accepts(SECRET));
        assert!(!token.accepts("op-token-7f3b"));
    }

    #[test]
    fn accepts_handles_length_mismatch() {
        let token = BearerToken::new(SECRET.to_string());
        assert!(!token.accepts(""));
        assert!(!token.accepts("op-token"));
        assert!(!token.accepts(&format!("{SECRET}-and-more")));
    }

    #[test]
    fn debug_never_prints_the_secret() {
        let token = BearerToken::new("do-not-log-me".to_string());
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("do-not-log-me"));
    }
}
