use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use emoney_core::{ServiceError, Transaction, TransactionId};

use super::SearchIndex;

/// Document map keyed by transaction id. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<HashMap<TransactionId, Transaction>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.documents.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful index calls, including overwrites.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn index_transaction(&self, tx: &Transaction) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::infrastructure("search index", "index unreachable"));
        }
        let mut documents = self
            .documents
            .write()
            .map_err(|_| ServiceError::infrastructure("search index", "lock poisoned"))?;
        documents.insert(tx.id, tx.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
