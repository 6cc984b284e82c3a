//! Process configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first if present; real
//! environment variables win over it.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Postgres pool sizing shared by both services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    pub http_addr: SocketAddr,
    pub db: DbConfig,
    pub redis_url: String,
    pub rabbitmq_url: String,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub bcrypt_cost: u32,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TransactionServiceConfig {
    pub http_addr: SocketAddr,
    pub db: DbConfig,
    pub rabbitmq_url: String,
    pub elasticsearch_url: String,
    pub jwt_secret: String,
    pub request_timeout: Duration,
}

impl AccountServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        Ok(Self {
            http_addr: env.parse_or("HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            db: DbConfig::from_env(&env)?,
            redis_url: env.required("REDIS_URL")?,
            rabbitmq_url: env.required("RABBITMQ_URL")?,
            jwt_secret: env.secret("JWT_SECRET")?,
            jwt_ttl: env.jwt_ttl()?,
            bcrypt_cost: env.bcrypt_cost()?,
            cache_ttl: Duration::from_secs(env.parse_or("CACHE_TTL_SECS", 86_400u64)?),
            request_timeout: Duration::from_millis(env.parse_or("REQUEST_TIMEOUT_MS", 10_000u64)?),
        })
    }
}

impl TransactionServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        Ok(Self {
            http_addr: env.parse_or("HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8081)))?,
            db: DbConfig::from_env(&env)?,
            rabbitmq_url: env.required("RABBITMQ_URL")?,
            elasticsearch_url: env.required("ELASTICSEARCH_URL")?,
            jwt_secret: env.secret("JWT_SECRET")?,
            request_timeout: Duration::from_millis(env.parse_or("REQUEST_TIMEOUT_MS", 10_000u64)?),
        })
    }
}

impl DbConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections: u32 = env.parse_or("DB_MAX_CONNECTIONS", 10)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            url: env.required("POSTGRES_URL")?,
            max_connections,
            acquire_timeout: Duration::from_millis(env.parse_or("DB_ACQUIRE_TIMEOUT_MS", 3_000u64)?),
        })
    }
}

fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
}

/// Upper bound for `JWT_TTL_SECS` (30 days).
const MAX_JWT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value: raw,
            }),
        }
    }

    /// Signing secrets have no default; a short one is refused outright.
    fn secret(&self, key: &'static str) -> Result<String, ConfigError> {
        let secret = self.required(key)?;
        if secret.len() < 16 {
            return Err(ConfigError::Invalid {
                key,
                value: "<redacted>".to_string(),
                reason: "must be at least 16 bytes".to_string(),
            });
        }
        Ok(secret)
    }

    fn jwt_ttl(&self) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parse_or("JWT_TTL_SECS", 86_400)?;
        if !(1..=MAX_JWT_TTL_SECS).contains(&secs) {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_SECS",
                value: secs.to_string(),
                reason: format!("must be between 1 and {MAX_JWT_TTL_SECS}"),
            });
        }
        Ok(Duration::from_secs(secs))
    }

    fn bcrypt_cost(&self) -> Result<u32, ConfigError> {
        let cost: u32 = self.parse_or("BCRYPT_COST", emoney_auth::password::DEFAULT_COST)?;
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const ACCOUNT_REQUIRED: &[(&str, &str)] = &[
        ("POSTGRES_URL", "postgres://localhost/accounts"),
        ("REDIS_URL", "redis://localhost"),
        ("RABBITMQ_URL", "amqp://localhost"),
        ("JWT_SECRET", "0123456789abcdef0123"),
    ];

    #[test]
    fn account_defaults_apply() {
        let cfg = AccountServiceConfig::from_lookup(lookup(ACCOUNT_REQUIRED)).unwrap();

        assert_eq!(cfg.http_addr.port(), 8080);
        assert_eq!(cfg.jwt_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.bcrypt_cost, 10);
        assert_eq!(cfg.db.max_connections, 10);
        assert_eq!(cfg.db.acquire_timeout, Duration::from_millis(3_000));
        assert_eq!(cfg.request_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let pairs: Vec<_> = ACCOUNT_REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "JWT_SECRET")
            .collect();
        let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let pairs: Vec<_> = ACCOUNT_REQUIRED
            .iter()
            .map(|&(k, v)| if k == "REDIS_URL" { (k, "   ") } else { (k, v) })
            .collect();
        let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("REDIS_URL"));
    }

    #[test]
    fn unparsable_number_names_the_key() {
        let mut pairs = ACCOUNT_REQUIRED.to_vec();
        pairs.push(("CACHE_TTL_SECS", "soon"));
        let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CACHE_TTL_SECS", .. }));
    }

    #[test]
    fn out_of_range_bcrypt_cost_is_rejected() {
        let mut pairs = ACCOUNT_REQUIRED.to_vec();
        pairs.push(("BCRYPT_COST", "3"));
        let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BCRYPT_COST", .. }));
    }

    #[test]
    fn jwt_ttl_is_bounded() {
        for ttl in ["0", "2592001", "18446744073709551615"] {
            let mut pairs = ACCOUNT_REQUIRED.to_vec();
            pairs.push(("JWT_TTL_SECS", ttl));
            let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: "JWT_TTL_SECS", .. }),
                "ttl {ttl}: {err}"
            );
        }

        let mut pairs = ACCOUNT_REQUIRED.to_vec();
        pairs.push(("JWT_TTL_SECS", "2592000"));
        let cfg = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.jwt_ttl, Duration::from_secs(2_592_000));
    }

    #[test]
    fn short_secret_is_rejected_without_echoing_it() {
        let mut pairs: Vec<_> = ACCOUNT_REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "JWT_SECRET")
            .collect();
        pairs.push(("JWT_SECRET", "short"));
        let err = AccountServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(!err.to_string().contains("short"));
    }

    #[test]
    fn transaction_service_needs_search_endpoint() {
        let base = [
            ("POSTGRES_URL", "postgres://localhost/transactions"),
            ("RABBITMQ_URL", "amqp://localhost"),
            ("JWT_SECRET", "0123456789abcdef0123"),
        ];
        let err = TransactionServiceConfig::from_lookup(lookup(&base)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ELASTICSEARCH_URL"));

        let mut full = base.to_vec();
        full.push(("ELASTICSEARCH_URL", "http://localhost:9200"));
        full.push(("HTTP_ADDR", "127.0.0.1:9000"));
        let cfg = TransactionServiceConfig::from_lookup(lookup(&full)).unwrap();
        assert_eq!(cfg.http_addr, "127.0.0.1:9000".parse().unwrap());
    }
}
