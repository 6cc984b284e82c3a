//! HTTP application wiring (Axum router).
//!
//! - `routes.rs`: handlers
//! - `dto.rs`: request/response bodies

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use emoney_auth::TokenValidator;
use emoney_http::{AuthState, auth_middleware, health, with_http_layers};

use crate::service::AccountService;

pub mod dto;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(
    accounts: AccountService,
    tokens: Arc<dyn TokenValidator>,
    request_timeout: Duration,
) -> Router {
    let accounts = Arc::new(accounts);

    // Protected routes: require a verified bearer token.
    let protected = Router::new()
        .route("/accounts/:id", get(routes::get_account))
        .layer(from_fn_with_state(AuthState::new(tokens), auth_middleware));

    let public = Router::new()
        .route("/accounts", post(routes::create_account))
        .route("/login", post(routes::login))
        .route("/health", get(health));

    with_http_layers(
        public.merge(protected).layer(Extension(accounts)),
        request_timeout,
    )
}
