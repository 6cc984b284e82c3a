//! Authorization interceptor for protected routes.
//!
//! Public routes (account creation, login, health) are simply not layered
//! with this middleware; everything behind it needs `authorization: Bearer
//! <token>`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use emoney_auth::{TokenValidator, extract_bearer};
use emoney_core::AuthError;

use crate::context::AuthenticatedAccount;
use crate::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenValidator>,
}

impl AuthState {
    pub fn new(tokens: Arc<dyn TokenValidator>) -> Self {
        Self { tokens }
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::Unauthenticated))
        .transpose()?;
    let token = extract_bearer(header)?;

    // Every verification failure is reported as unauthenticated; the reason
    // goes in the message.
    let claims = state.tokens.validate(token, Utc::now()).map_err(|kind| {
        debug!(reason = %kind, "bearer token rejected");
        ApiError::from(AuthError::Unauthenticated).with_message(format!("invalid token: {kind}"))
    })?;

    debug!(account_id = %claims.account_id, "request authenticated");
    req.extensions_mut().insert(AuthenticatedAccount::new(claims));

    Ok(next.run(req).await)
}
