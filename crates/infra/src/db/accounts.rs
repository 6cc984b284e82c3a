use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use emoney_core::{Account, AccountId, Email, Money, ServiceError};

use super::map_sqlx_error;
use crate::stores::AccountRecords;

/// Store of record for accounts. The `accounts_email_key` constraint is the
/// only arbiter of email uniqueness.
#[derive(Debug, Clone)]
pub struct PostgresAccountRecords {
    pool: PgPool,
}

impl PostgresAccountRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    balance: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = ServiceError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let row_id = row.id;
        let corrupt =
            move |e: ServiceError| ServiceError::infrastructure(format!("corrupt account row {row_id}"), e);
        Ok(Account {
            id: AccountId::from_uuid(row.id),
            email: Email::parse(&row.email).map_err(corrupt)?,
            balance: Money::from_minor(row.balance).map_err(corrupt)?,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, name, email, password_hash, balance, created_at, updated_at
    FROM accounts
"#;

#[async_trait]
impl AccountRecords for PostgresAccountRecords {
    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert(&self, account: &Account) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.balance.minor_units())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert account", e) {
            ServiceError::Conflict(_) => ServiceError::conflict("email already registered"),
            other => other,
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, ServiceError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find account by id", e))?;

        row.map(Account::try_from).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, ServiceError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{SELECT_ACCOUNT} WHERE email = $1"))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("find account by email", e))?;

        row.map(Account::try_from).transpose()
    }
}
