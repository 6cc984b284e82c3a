//! Transaction service: recording, history and the account mirror consumer.

pub mod app;
pub mod consumer;
pub mod service;

pub use consumer::AccountCreatedHandler;
pub use service::TransactionService;
