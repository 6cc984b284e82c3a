//! Transactions: append-only facts of value movement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Money, ServiceError, TransactionId};

const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Funds entering the system; there is no sending account.
    Topup,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Topup => "topup",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topup" => Ok(Self::Topup),
            "transfer" => Ok(Self::Transfer),
            other => Err(ServiceError::validation(format!(
                "unknown transaction type '{other}'"
            ))),
        }
    }
}

/// A recorded transaction. Never updated or deleted once created.
///
/// The serialized form doubles as the search-index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_account_id: Option<AccountId>,
    pub to_account_id: AccountId,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated request to record a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub from_account_id: Option<AccountId>,
    pub to_account_id: AccountId,
    pub amount: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Validate and stamp the transaction with its identity and time.
    ///
    /// - amount is strictly positive
    /// - a top-up has no sender
    /// - a transfer has a sender distinct from the receiver
    pub fn into_transaction(
        self,
        id: TransactionId,
        created_at: DateTime<Utc>,
    ) -> Result<Transaction, ServiceError> {
        if self.amount <= 0 {
            return Err(ServiceError::validation("amount must be strictly positive"));
        }

        match (self.transaction_type, self.from_account_id) {
            (TransactionType::Topup, Some(_)) => {
                return Err(ServiceError::validation("a topup must not have a sending account"));
            }
            (TransactionType::Transfer, None) => {
                return Err(ServiceError::validation("a transfer requires a sending account"));
            }
            (TransactionType::Transfer, Some(from)) if from == self.to_account_id => {
                return Err(ServiceError::validation("cannot transfer to the same account"));
            }
            _ => {}
        }

        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(ServiceError::validation(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }

        Ok(Transaction {
            id,
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            amount: Money::from_minor(self.amount)?,
            transaction_type: self.transaction_type,
            notes,
            created_at,
        })
    }

    /// The account whose owner must authorize this transaction.
    pub fn debited_account(&self) -> AccountId {
        match self.transaction_type {
            TransactionType::Topup => self.to_account_id,
            TransactionType::Transfer => self.from_account_id.unwrap_or(self.to_account_id),
        }
    }
}

impl Transaction {
    /// Whether `account` is the sender or the receiver.
    pub fn involves(&self, account: AccountId) -> bool {
        self.to_account_id == account || self.from_account_id == Some(account)
    }
}
