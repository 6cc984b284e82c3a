//! Transaction orchestrator.

use chrono::Utc;
use tracing::{info, instrument};

use emoney_auth::{AccountClaims, authorize_account_access};
use emoney_core::{
    AccountId, NewTransaction, Page, PageRequest, ServiceResult, Transaction, TransactionId,
};
use emoney_infra::TransactionStore;

#[derive(Debug, Clone)]
pub struct TransactionService {
    store: TransactionStore,
}

impl TransactionService {
    pub fn new(store: TransactionStore) -> Self {
        Self { store }
    }

    /// Validate, check that the caller owns the debited account, then
    /// record. Balances are not touched.
    #[instrument(skip_all, fields(caller = %caller.account_id), err)]
    pub async fn record_transaction(
        &self,
        caller: &AccountClaims,
        request: NewTransaction,
    ) -> ServiceResult<Transaction> {
        let debited = request.debited_account();
        let tx = request.into_transaction(TransactionId::new(), Utc::now())?;
        authorize_account_access(caller, debited)?;

        self.store.create(&tx).await?;
        info!(
            transaction_id = %tx.id,
            transaction_type = %tx.transaction_type,
            amount = tx.amount.minor_units(),
            "transaction recorded"
        );
        Ok(tx)
    }

    #[instrument(skip_all, fields(account_id = %account), err)]
    pub async fn history(
        &self,
        caller: &AccountClaims,
        account: AccountId,
        page: PageRequest,
    ) -> ServiceResult<Page<Transaction>> {
        authorize_account_access(caller, account)?;
        self.store.find_history(account, page).await
    }
}
