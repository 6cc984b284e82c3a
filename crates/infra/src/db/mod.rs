//! Postgres adapters: pool construction, migrations and error mapping.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | ServiceError | Scenario |
//! |------------|----------------------|--------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate email, duplicate id |
//! | Database (foreign key violation) | `23503` | `Validation` | Transaction references an unknown account |
//! | Database (check constraint violation) | `23514` | `Validation` | Negative balance, non-positive amount |
//! | PoolTimedOut | N/A | `Infrastructure` | No connection within the acquire timeout |
//! | Other | N/A | `Infrastructure` | Network errors, connection failures, etc. |

mod accounts;
mod transactions;

pub use accounts::PostgresAccountRecords;
pub use transactions::PostgresTransactionRecords;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use emoney_core::ServiceError;

use crate::config::DbConfig;

/// Open a bounded pool. Callers that cannot get a connection within the
/// acquire timeout fail instead of queueing indefinitely.
pub async fn connect_pool(config: &DbConfig) -> Result<PgPool, ServiceError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    info!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "postgres pool ready"
    );
    Ok(pool)
}

/// Schema for the account service's store of record.
pub async fn migrate_accounts(pool: &PgPool) -> Result<(), ServiceError> {
    sqlx::migrate!("./migrations/accounts")
        .run(pool)
        .await
        .map_err(|e| ServiceError::infrastructure("account migrations", e))
}

/// Schema for the transaction service's store of record (including its
/// account mirror).
pub async fn migrate_transactions(pool: &PgPool) -> Result<(), ServiceError> {
    sqlx::migrate!("./migrations/transactions")
        .run(pool)
        .await
        .map_err(|e| ServiceError::infrastructure("transaction migrations", e))
}

/// Map SQLx errors to the service taxonomy.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unnamed").to_string();
        match db_err.code().as_deref() {
            Some("23505") => {
                return ServiceError::conflict(format!(
                    "{operation}: unique constraint {constraint} violated"
                ));
            }
            Some("23503") => {
                return ServiceError::validation(format!(
                    "{operation}: referenced record does not exist ({constraint})"
                ));
            }
            Some("23514") => {
                return ServiceError::validation(format!(
                    "{operation}: check constraint {constraint} violated"
                ));
            }
            _ => {}
        }
    }
    ServiceError::infrastructure(format!("postgres {operation}"), err)
}
