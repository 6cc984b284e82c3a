use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use emoney_core::{AccountId, AccountProfile, ServiceError};

use super::AccountCache;

/// In-memory cache with per-entry expiry and switchable failures.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountCache {
    entries: RwLock<HashMap<AccountId, (AccountProfile, Instant)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryAccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Live entry for `id`, bypassing failure injection.
    pub fn peek(&self, id: AccountId) -> Option<AccountProfile> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&id)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(profile, _)| profile.clone())
    }
}

#[async_trait]
impl AccountCache for InMemoryAccountCache {
    async fn get(&self, id: AccountId) -> Result<Option<AccountProfile>, ServiceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ServiceError::infrastructure("cache get", "cache unreachable"));
        }
        Ok(self.peek(id))
    }

    async fn put(&self, profile: &AccountProfile, ttl: Duration) -> Result<(), ServiceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ServiceError::infrastructure("cache put", "cache unreachable"));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ServiceError::infrastructure("cache put", "lock poisoned"))?;
        entries.insert(profile.id, (profile.clone(), Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use emoney_core::{Email, Money};

    fn profile() -> AccountProfile {
        let now = Utc::now();
        AccountProfile {
            id: AccountId::new(),
            name: "Alice".to_string(),
            email: Email::parse("alice@x.com").unwrap(),
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn entry_is_served_until_it_expires() {
        let cache = InMemoryAccountCache::new();
        let live = profile();
        let stale = profile();

        cache.put(&live, Duration::from_secs(60)).await.unwrap();
        cache.put(&stale, Duration::ZERO).await.unwrap();

        assert_eq!(cache.get(live.id).await.unwrap(), Some(live));
        assert_eq!(cache.get(stale.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_infrastructure() {
        let cache = InMemoryAccountCache::new();
        cache.fail_writes(true);
        assert!(cache.put(&profile(), Duration::from_secs(60)).await.unwrap_err().is_infrastructure());

        cache.fail_reads(true);
        assert!(cache.get(AccountId::new()).await.unwrap_err().is_infrastructure());
    }
}
