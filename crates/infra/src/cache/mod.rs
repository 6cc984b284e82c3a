//! Read cache for account profiles (cache-aside).
//!
//! The cache is never a source of truth: a read error is treated as a miss
//! by callers and a failed populate is logged and dropped. Concurrent
//! populates on the same key are last-writer-wins.

mod in_memory;
mod redis_cache;

pub use in_memory::InMemoryAccountCache;
pub use redis_cache::RedisAccountCache;

use std::time::Duration;

use async_trait::async_trait;

use emoney_core::{AccountId, AccountProfile, ServiceError};

/// Cache key for an account profile.
pub fn cache_key(id: AccountId) -> String {
    format!("account:{id}")
}

#[async_trait]
pub trait AccountCache: Send + Sync {
    async fn get(&self, id: AccountId) -> Result<Option<AccountProfile>, ServiceError>;

    /// Overwrite the entry, expiring it after `ttl`.
    async fn put(&self, profile: &AccountProfile, ttl: Duration) -> Result<(), ServiceError>;
}
