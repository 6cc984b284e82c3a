//! Cache-aside account repository.
//!
//! ```text
//! GetByID:    cache ──hit──▶ return
//!               │miss/err
//!               ▼
//!             store of record ──▶ populate cache (best effort) ──▶ return
//! ```
//!
//! `create` never populates the cache and `get_by_email` never reads it:
//! email lookups gate login and registration, so they always see the
//! current store state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use emoney_auth::PasswordHasher;
use emoney_core::{Account, AccountId, AccountProfile, Email, Money, ServiceError, ServiceResult};

use super::records::AccountRecords;
use crate::cache::AccountCache;

/// Profile cache lifetime when nothing else is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct AccountStore {
    records: Arc<dyn AccountRecords>,
    cache: Arc<dyn AccountCache>,
    hasher: PasswordHasher,
    cache_ttl: Duration,
}

impl core::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountStore")
            .field("hasher", &self.hasher)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl AccountStore {
    pub fn new(
        records: Arc<dyn AccountRecords>,
        cache: Arc<dyn AccountCache>,
        hasher: PasswordHasher,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            records,
            cache,
            hasher,
            cache_ttl,
        }
    }

    /// Hash the password and insert a fresh account with a zero balance.
    ///
    /// A duplicate email surfaces as `Conflict` from the store's uniqueness
    /// constraint, including when two creations race.
    #[instrument(skip(self, name, email, password), err)]
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> ServiceResult<Account> {
        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            name: name.to_string(),
            email: email.clone(),
            password_hash,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        };

        self.records.insert(&account).await?;
        info!(account_id = %account.id, "account persisted");
        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    pub async fn get_by_id(&self, id: AccountId) -> ServiceResult<AccountProfile> {
        match self.cache.get(id).await {
            Ok(Some(profile)) => {
                debug!("account cache hit");
                return Ok(profile);
            }
            Ok(None) => debug!("account cache miss"),
            Err(e) => warn!(error = %e, "account cache read failed, reading store of record"),
        }

        let account = self
            .records
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("account {id} not found")))?;
        let profile = account.profile();

        if let Err(e) = self.cache.put(&profile, self.cache_ttl).await {
            warn!(error = %e, "account cache populate failed");
        }
        Ok(profile)
    }

    /// Always the store of record; absence is `Ok(None)`.
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&self, email: &Email) -> ServiceResult<Option<Account>> {
        self.records.find_by_email(email).await
    }
}
