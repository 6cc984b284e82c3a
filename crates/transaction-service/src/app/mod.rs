//! HTTP application wiring (Axum router).

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use emoney_auth::TokenValidator;
use emoney_http::{AuthState, auth_middleware, health, with_http_layers};

use crate::service::TransactionService;

pub mod dto;
pub mod routes;

pub fn build_app(
    transactions: TransactionService,
    tokens: Arc<dyn TokenValidator>,
    request_timeout: Duration,
) -> Router {
    // Every route except health needs a verified bearer token.
    let protected = Router::new()
        .route("/transactions", post(routes::create_transaction))
        .route("/accounts/:id/transactions", get(routes::account_history))
        .layer(from_fn_with_state(AuthState::new(tokens), auth_middleware));

    with_http_layers(
        Router::new()
            .route("/health", get(health))
            .merge(protected)
            .layer(Extension(Arc::new(transactions))),
        request_timeout,
    )
}
