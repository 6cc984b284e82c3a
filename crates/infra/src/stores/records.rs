//! Store-of-record ports. Postgres in production, in-memory under test.

use async_trait::async_trait;

use emoney_core::{Account, AccountId, Email, PageRequest, ServiceError, Transaction};

#[async_trait]
pub trait AccountRecords: Send + Sync {
    /// Insert a new account. A duplicate email is a `Conflict`.
    async fn insert(&self, account: &Account) -> Result<(), ServiceError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, ServiceError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, ServiceError>;
}

#[async_trait]
pub trait TransactionRecords: Send + Sync {
    /// Insert a transaction. Both referenced accounts must already be
    /// mirrored; otherwise `Validation`.
    async fn insert(&self, tx: &Transaction) -> Result<(), ServiceError>;

    /// One page of the account's history (sender or receiver), most recent
    /// first, insertion order breaking ties.
    async fn find_history(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, ServiceError>;

    /// Full matching count, independent of any page window.
    async fn count_history(&self, account: AccountId) -> Result<u64, ServiceError>;

    /// Record an account the transaction store has not seen yet. Returns
    /// `false` when the id was already mirrored.
    async fn mirror_account(
        &self,
        id: AccountId,
        name: &str,
        email: &Email,
    ) -> Result<bool, ServiceError>;
}
