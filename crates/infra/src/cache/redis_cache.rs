use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{instrument, warn};

use emoney_core::{AccountId, AccountProfile, ServiceError};

use super::{AccountCache, cache_key};

/// Redis-backed profile cache. Values are JSON `AccountProfile`s stored
/// with `SET .. EX`.
///
/// `ConnectionManager` is cheap to clone and reconnects on its own, so each
/// call works on a clone instead of locking a shared connection.
#[derive(Clone)]
pub struct RedisAccountCache {
    conn: ConnectionManager,
}

impl core::fmt::Debug for RedisAccountCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisAccountCache").finish_non_exhaustive()
    }
}

impl RedisAccountCache {
    pub async fn connect(redis_url: &str) -> Result<Self, ServiceError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| ServiceError::infrastructure("redis client", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ServiceError::infrastructure("redis connect", e))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl AccountCache for RedisAccountCache {
    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn get(&self, id: AccountId) -> Result<Option<AccountProfile>, ServiceError> {
        let key = cache_key(id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| ServiceError::infrastructure("redis GET", e))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                // An entry written by an older layout reads as a miss and is
                // overwritten by the next populate.
                warn!(key = %key, error = %e, "undecodable cache entry");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, profile), fields(account_id = %profile.id), err)]
    async fn put(&self, profile: &AccountProfile, ttl: Duration) -> Result<(), ServiceError> {
        let payload = serde_json::to_string(profile)
            .map_err(|e| ServiceError::infrastructure("cache encode", e))?;
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(cache_key(profile.id))
            .arg(payload)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| ServiceError::infrastructure("redis SET", e))?;
        Ok(())
    }
}
