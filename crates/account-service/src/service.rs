//! Account orchestrator: validates input and sequences the store, the event
//! publisher and the token service.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use emoney_auth::{Hs256TokenService, PasswordHasher, validate_password};
use emoney_core::{AccountId, AccountProfile, AuthError, Email, ServiceError, ServiceResult};
use emoney_events::AccountEventPublisher;
use emoney_infra::AccountStore;

const MAX_NAME_LEN: usize = 100;

#[derive(Clone)]
pub struct AccountService {
    store: AccountStore,
    publisher: Arc<dyn AccountEventPublisher>,
    tokens: Arc<Hs256TokenService>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(
        store: AccountStore,
        publisher: Arc<dyn AccountEventPublisher>,
        tokens: Arc<Hs256TokenService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            publisher,
            tokens,
            hasher,
        }
    }

    /// Register an account and announce it.
    ///
    /// The email pre-check only produces a friendlier early error; two racing
    /// registrations are still resolved by the store's uniqueness constraint.
    /// If the publish fails after the insert, the account stays persisted and
    /// the call still fails.
    #[instrument(skip_all, err)]
    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<AccountId> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.store.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict("email already registered"));
        }

        let account = self.store.create(name, &email, password).await?;

        if let Err(e) = self
            .publisher
            .publish_account_created(account.id, &account.name, &account.email)
            .await
        {
            warn!(
                account_id = %account.id,
                error = %e,
                "account persisted but account.created was not published"
            );
            return Err(e);
        }

        info!(account_id = %account.id, "account created");
        Ok(account.id)
    }

    /// Exchange credentials for a bearer token. Unknown email and wrong
    /// password are indistinguishable to the caller.
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<String> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = self
            .store
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = self
            .hasher
            .verify_blocking(password.to_string(), account.password_hash.clone())
            .await;
        if !verified {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.tokens.issue(account.id, &account.email, Utc::now())?;
        info!(account_id = %account.id, "login succeeded");
        Ok(token)
    }

    /// Callers must already have passed the ownership check.
    pub async fn get_account(&self, id: AccountId) -> ServiceResult<AccountProfile> {
        self.store.get_by_id(id).await
    }
}

fn validate_name(raw: &str) -> ServiceResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}
