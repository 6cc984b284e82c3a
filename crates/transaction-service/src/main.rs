use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use emoney_auth::Hs256TokenService;
use emoney_events::ACCOUNT_CREATED_ROUTING_KEY;
use emoney_infra::db::{self, PostgresTransactionRecords};
use emoney_infra::messaging::{ACCOUNT_CREATED_QUEUE, Backoff, stopped, supervise};
use emoney_infra::{AmqpConsumer, ElasticsearchIndex, TransactionServiceConfig, TransactionStore};
use emoney_transaction_service::{AccountCreatedHandler, TransactionService, app::build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emoney_observability::init("transaction-service");

    let config = TransactionServiceConfig::from_env().context("loading configuration")?;

    let pool = db::connect_pool(&config.db).await?;
    db::migrate_transactions(&pool).await?;

    let index = ElasticsearchIndex::new(&config.elasticsearch_url, config.request_timeout)?;
    let store = TransactionStore::new(
        Arc::new(PostgresTransactionRecords::new(pool.clone())),
        Arc::new(index),
    );

    // The mirror consumer reconnects on its own; it only stops at shutdown.
    let handler = Arc::new(AccountCreatedHandler::new(store.clone()));
    let rabbitmq_url = config.rabbitmq_url.clone();
    let (stop_tx, stop_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(supervise(
        ACCOUNT_CREATED_QUEUE,
        move |stop| {
            let url = rabbitmq_url.clone();
            let handler = handler.clone();
            async move {
                let consumer =
                    AmqpConsumer::bind(&url, ACCOUNT_CREATED_QUEUE, ACCOUNT_CREATED_ROUTING_KEY)
                        .await?;
                consumer.run(handler, stopped(stop)).await
            }
        },
        stop_rx,
        Backoff::default(),
    ));

    // Tokens are only verified here; the ttl is irrelevant.
    let tokens = Arc::new(Hs256TokenService::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::zero(),
    ));
    let app = build_app(TransactionService::new(store), tokens, config.request_timeout);

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "transaction service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(emoney_http::shutdown_signal())
        .await?;

    let _ = stop_tx.send(true);
    if let Err(e) = consumer_task.await {
        tracing::error!(error = %e, "consumer task panicked");
    }

    pool.close().await;
    tracing::info!("transaction service stopped");
    Ok(())
}
