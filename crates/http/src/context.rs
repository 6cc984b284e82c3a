use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use emoney_auth::{AccountClaims, authorize_account_access};
use emoney_core::{AccountId, AuthError, Email};

use crate::errors::ApiError;

/// Verified caller identity for a request.
///
/// Inserted into the request extensions by the auth middleware and pulled
/// out by handlers as an extractor. A handler that takes this argument can
/// only run behind the middleware; without it the request is rejected as
/// unauthenticated rather than reaching the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    claims: AccountClaims,
}

impl AuthenticatedAccount {
    pub fn new(claims: AccountClaims) -> Self {
        Self { claims }
    }

    pub fn account_id(&self) -> AccountId {
        self.claims.account_id
    }

    pub fn email(&self) -> &Email {
        &self.claims.email
    }

    pub fn claims(&self) -> &AccountClaims {
        &self.claims
    }

    /// Resource-level check: the caller may only touch its own account.
    pub fn authorize(&self, requested: AccountId) -> Result<(), ApiError> {
        authorize_account_access(&self.claims, requested).map_err(ApiError::from)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
