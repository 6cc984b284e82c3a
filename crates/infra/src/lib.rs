//! Infrastructure layer: store of record, read cache, search index, broker,
//! config, plus the stores that keep them consistent.

pub mod cache;
pub mod config;
pub mod db;
pub mod messaging;
pub mod search;
pub mod stores;

pub use cache::{AccountCache, InMemoryAccountCache, RedisAccountCache};
pub use config::{AccountServiceConfig, ConfigError, TransactionServiceConfig};
pub use messaging::{AmqpConsumer, AmqpMessageBus};
pub use search::{ElasticsearchIndex, InMemorySearchIndex, SearchIndex};
pub use stores::{
    AccountRecords, AccountStore, InMemoryAccountRecords, InMemoryTransactionRecords,
    TransactionRecords, TransactionStore,
};
