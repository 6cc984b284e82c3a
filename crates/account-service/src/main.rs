use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use emoney_account_service::{AccountService, app::build_app};
use emoney_auth::{Hs256TokenService, PasswordHasher};
use emoney_events::BusAccountPublisher;
use emoney_infra::db::{self, PostgresAccountRecords};
use emoney_infra::{AccountServiceConfig, AccountStore, AmqpMessageBus, RedisAccountCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emoney_observability::init("account-service");

    let config = AccountServiceConfig::from_env().context("loading configuration")?;

    let pool = db::connect_pool(&config.db).await?;
    db::migrate_accounts(&pool).await?;

    let cache = RedisAccountCache::connect(&config.redis_url).await?;
    let hasher = PasswordHasher::new(config.bcrypt_cost)?;
    let store = AccountStore::new(
        Arc::new(PostgresAccountRecords::new(pool.clone())),
        Arc::new(cache),
        hasher,
        config.cache_ttl,
    );

    let bus = AmqpMessageBus::connect(&config.rabbitmq_url).await?;
    let publisher = Arc::new(BusAccountPublisher::new(bus));

    let jwt_ttl = chrono::Duration::from_std(config.jwt_ttl).context("JWT_TTL_SECS out of range")?;
    let tokens = Arc::new(Hs256TokenService::new(config.jwt_secret.as_bytes(), jwt_ttl));

    let accounts = AccountService::new(store, publisher, tokens.clone(), hasher);
    let app = build_app(accounts, tokens, config.request_timeout);

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "account service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(emoney_http::shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("account service stopped");
    Ok(())
}
