//! HTTP plumbing shared by the account and transaction services: the
//! bearer-token interceptor, the typed claim carrier, error responses and
//! server lifecycle helpers.

pub mod context;
pub mod errors;
pub mod middleware;

use std::time::Duration;

use axum::{Router, http::StatusCode};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use context::AuthenticatedAccount;
pub use errors::{ApiError, json_error};
pub use middleware::{AuthState, auth_middleware};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Request spans plus a per-request deadline. A request past the deadline
/// is answered with `408` and its handler future is dropped, which cancels
/// whatever store, cache or broker call it was awaiting.
pub fn with_http_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

/// Resolves on ctrl-c (and SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use chrono::{Duration as ChronoDuration, Utc};
    use tower::ServiceExt;

    use emoney_auth::Hs256TokenService;
    use emoney_core::{AccountId, Email};

    const SECRET: &[u8] = b"middleware-test-secret";

    async fn whoami(caller: AuthenticatedAccount) -> String {
        caller.account_id().to_string()
    }

    fn app() -> Router {
        let tokens = Arc::new(Hs256TokenService::new(SECRET, ChronoDuration::hours(1)));
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(AuthState::new(tokens), auth_middleware))
            .route("/health", get(health))
    }

    fn token(issued_at: chrono::DateTime<Utc>, id: AccountId) -> String {
        Hs256TokenService::new(SECRET, ChronoDuration::hours(1))
            .issue(id, &Email::parse("a@x.com").unwrap(), issued_at)
            .unwrap()
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::get("/whoami");
        if let Some(value) = auth {
            req = req.header("authorization", value);
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn claims_reach_the_handler() {
        let id = AccountId::new();
        let res = app()
            .oneshot(
                Request::get("/whoami")
                    .header("authorization", format!("Bearer {}", token(Utc::now(), id)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn missing_or_misformatted_header_is_unauthenticated() {
        for auth in [None, Some("Token abc".to_string()), Some("Bearer ".to_string())] {
            let (status, body) = call(app(), auth).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "unauthenticated");
        }
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let stale = token(Utc::now() - ChronoDuration::hours(2), AccountId::new());
        let (status, body) = call(app(), Some(format!("Bearer {stale}"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");
        assert!(body["message"].as_str().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn handler_without_middleware_rejects_instead_of_running() {
        let unprotected = Router::new().route("/whoami", get(whoami));
        let (status, _) = call(unprotected, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
