//! Secondary search index for transactions.
//!
//! Documents are keyed by transaction id, so re-indexing a retried write
//! overwrites instead of duplicating. The index is never consulted for
//! ordering or counts; the store of record is authoritative for both.

mod elasticsearch;
mod in_memory;

pub use elasticsearch::ElasticsearchIndex;
pub use in_memory::InMemorySearchIndex;

use async_trait::async_trait;

use emoney_core::{ServiceError, Transaction};

pub const TRANSACTIONS_INDEX: &str = "transactions";

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Upsert the document for `tx` under its id.
    async fn index_transaction(&self, tx: &Transaction) -> Result<(), ServiceError>;
}
