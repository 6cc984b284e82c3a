//! Stores that keep the store of record and its mirrors consistent.

mod account_store;
mod in_memory;
mod records;
mod transaction_store;

pub use account_store::{AccountStore, DEFAULT_CACHE_TTL};
pub use in_memory::{InMemoryAccountRecords, InMemoryTransactionRecords};
pub use records::{AccountRecords, TransactionRecords};
pub use transaction_store::TransactionStore;
