//! Dual-write transaction repository.
//!
//! The store-of-record insert is the durability boundary. The search index
//! is written after it with no shared transaction, so an index failure
//! leaves a committed row the caller was told failed. Documents are keyed
//! by transaction id, so re-indexing the same record overwrites.

use std::sync::Arc;

use tracing::{error, info, instrument};

use emoney_core::{AccountId, Email, Page, PageRequest, ServiceResult, Transaction};

use super::records::TransactionRecords;
use crate::search::SearchIndex;

#[derive(Clone)]
pub struct TransactionStore {
    records: Arc<dyn TransactionRecords>,
    index: Arc<dyn SearchIndex>,
}

impl core::fmt::Debug for TransactionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransactionStore").finish_non_exhaustive()
    }
}

impl TransactionStore {
    pub fn new(records: Arc<dyn TransactionRecords>, index: Arc<dyn SearchIndex>) -> Self {
        Self { records, index }
    }

    #[instrument(skip(self, tx), fields(transaction_id = %tx.id), err)]
    pub async fn create(&self, tx: &Transaction) -> ServiceResult<()> {
        self.records.insert(tx).await?;
        info!("transaction committed");

        if let Err(e) = self.index.index_transaction(tx).await {
            error!(
                error = %e,
                "transaction committed but not indexed; search will miss it until re-indexed"
            );
            return Err(e);
        }
        Ok(())
    }

    /// History page from the store of record, with the total computed by a
    /// separate count so it does not depend on the page window.
    #[instrument(skip(self), fields(account_id = %account), err)]
    pub async fn find_history(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> ServiceResult<Page<Transaction>> {
        let items = self.records.find_history(account, page).await?;
        let total = self.records.count_history(account).await?;
        Ok(Page {
            items,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }

    /// Idempotent; `Ok(false)` means the account was already mirrored.
    #[instrument(skip(self, name, email), fields(account_id = %id), err)]
    pub async fn mirror_account(
        &self,
        id: AccountId,
        name: &str,
        email: &Email,
    ) -> ServiceResult<bool> {
        self.records.mirror_account(id, name, email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use emoney_core::{Money, ServiceError, TransactionId, TransactionType};

    use crate::search::InMemorySearchIndex;
    use crate::stores::InMemoryTransactionRecords;

    struct Fixture {
        index: Arc<InMemorySearchIndex>,
        store: TransactionStore,
        account: AccountId,
    }

    async fn fixture() -> Fixture {
        let records = Arc::new(InMemoryTransactionRecords::new());
        let index = Arc::new(InMemorySearchIndex::new());
        let store = TransactionStore::new(records, index.clone());
        let account = AccountId::new();
        store
            .mirror_account(account, "Alice", &Email::parse("alice@x.com").unwrap())
            .await
            .unwrap();
        Fixture {
            index,
            store,
            account,
        }
    }

    fn topup(to: AccountId, minutes_ago: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            from_account_id: None,
            to_account_id: to,
            amount: Money::from_minor(100).unwrap(),
            transaction_type: TransactionType::Topup,
            notes: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn created_transaction_is_in_history_and_index() {
        let f = fixture().await;
        let tx = topup(f.account, 0);

        f.store.create(&tx).await.unwrap();

        let page = f
            .store
            .find_history(f.account, PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.items, vec![tx.clone()]);
        assert_eq!(page.total, 1);
        assert_eq!(f.index.get(tx.id), Some(tx));
    }

    #[tokio::test]
    async fn index_failure_reports_failure_but_keeps_the_row() {
        let f = fixture().await;
        f.index.fail_writes(true);
        let tx = topup(f.account, 0);

        let err = f.store.create(&tx).await.unwrap_err();
        assert!(err.is_infrastructure());

        let page = f
            .store
            .find_history(f.account, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items, vec![tx]);
        assert!(f.index.is_empty());
    }

    #[tokio::test]
    async fn history_pages_are_disjoint_and_total_is_window_independent() {
        let f = fixture().await;
        for minutes_ago in 0..25 {
            f.store.create(&topup(f.account, minutes_ago)).await.unwrap();
        }

        let mut seen = Vec::new();
        for (page_no, expected_len) in [(1, 10), (2, 10), (3, 5), (4, 0)] {
            let page = f
                .store
                .find_history(f.account, PageRequest::new(page_no, 10).unwrap())
                .await
                .unwrap();
            assert_eq!(page.items.len(), expected_len, "page {page_no}");
            assert_eq!(page.total, 25);
            seen.extend(page.items);
        }

        assert_eq!(seen.len(), 25);
        assert!(seen.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        let mut ids: Vec<_> = seen.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn history_includes_both_directions_only() {
        let f = fixture().await;
        let other = AccountId::new();
        let third = AccountId::new();
        for id in [other, third] {
            f.store
                .mirror_account(id, "Other", &Email::parse(&format!("{id}@x.com")).unwrap())
                .await
                .unwrap();
        }

        let outgoing = Transaction {
            from_account_id: Some(f.account),
            to_account_id: other,
            transaction_type: TransactionType::Transfer,
            ..topup(other, 2)
        };
        let incoming = Transaction {
            from_account_id: Some(other),
            to_account_id: f.account,
            transaction_type: TransactionType::Transfer,
            ..topup(f.account, 1)
        };
        let unrelated = topup(third, 0);
        for tx in [&outgoing, &incoming, &unrelated] {
            f.store.create(tx).await.unwrap();
        }

        let page = f
            .store
            .find_history(f.account, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items, vec![incoming, outgoing]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn unknown_receiver_is_rejected() {
        let f = fixture().await;
        let err = f.store.create(&topup(AccountId::new(), 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(f.index.is_empty());
    }
}
