use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use emoney_core::{
    AccountId, Email, Money, PageRequest, ServiceError, Transaction, TransactionId,
};

use super::map_sqlx_error;
use crate::stores::TransactionRecords;

/// Store of record for transactions, plus the local account mirror the
/// foreign keys point at.
#[derive(Debug, Clone)]
pub struct PostgresTransactionRecords {
    pool: PgPool,
}

impl PostgresTransactionRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    from_account_id: Option<Uuid>,
    to_account_id: Uuid,
    amount: i64,
    transaction_type: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = ServiceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let row_id = row.id;
        let corrupt = move |e: ServiceError| {
            ServiceError::infrastructure(format!("corrupt transaction row {row_id}"), e)
        };
        Ok(Transaction {
            id: TransactionId::from_uuid(row.id),
            from_account_id: row.from_account_id.map(AccountId::from_uuid),
            to_account_id: AccountId::from_uuid(row.to_account_id),
            amount: Money::from_minor(row.amount).map_err(corrupt)?,
            transaction_type: row.transaction_type.parse().map_err(corrupt)?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl TransactionRecords for PostgresTransactionRecords {
    #[instrument(skip(self, tx), fields(transaction_id = %tx.id), err)]
    async fn insert(&self, tx: &Transaction) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, from_account_id, to_account_id, amount, transaction_type, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tx.id.as_uuid())
        .bind(tx.from_account_id.map(Uuid::from))
        .bind(tx.to_account_id.as_uuid())
        .bind(tx.amount.minor_units())
        .bind(tx.transaction_type.as_str())
        .bind(tx.notes.as_deref())
        .bind(tx.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert transaction", e))?;
        Ok(())
    }

    /// Most recent first; `sequence` breaks ties between rows stamped with the
    /// same `created_at`.
    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn find_history(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, ServiceError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, from_account_id, to_account_id, amount, transaction_type, notes, created_at
            FROM transactions
            WHERE from_account_id = $1 OR to_account_id = $1
            ORDER BY created_at DESC, sequence DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find transaction history", e))?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn count_history(&self, account: AccountId) -> Result<u64, ServiceError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE from_account_id = $1 OR to_account_id = $1
            "#,
        )
        .bind(account.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count transaction history", e))?;

        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self, name, email), fields(account_id = %id), err)]
    async fn mirror_account(
        &self,
        id: AccountId,
        name: &str,
        email: &Email,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, balance)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(email.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("mirror account", e))?;

        Ok(result.rows_affected() == 1)
    }
}
