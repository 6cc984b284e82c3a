//! `emoney-core` — domain records, identifiers and the service error taxonomy.
//!
//! This crate is pure: no IO, no async, no driver types.

pub mod account;
pub mod error;
pub mod id;
pub mod page;
pub mod transaction;
pub mod value_object;

pub use account::{Account, AccountProfile};
pub use error::{AuthError, BoxError, ServiceError, ServiceResult};
pub use id::{AccountId, TransactionId};
pub use page::{Page, PageRequest};
pub use transaction::{NewTransaction, Transaction, TransactionType};
pub use value_object::{Email, Money};
