//! Account record and its credential-free projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Email, Money};

/// Account row as held by the store of record.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// service. Anything that crosses a boundary (cache, RPC response, event)
/// goes through [`AccountProfile`].
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            balance: self.balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("balance", &self.balance)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Account without credential material; this is what the read cache holds
/// and what `GetAccount` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            name: "Alice".to_string(),
            email: Email::parse("alice@x.com").unwrap(),
            password_hash: "$2b$04$secret-hash".to_string(),
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn debug_output_redacts_hash() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("secret-hash"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn profile_serialization_has_no_password_field() {
        let json = serde_json::to_value(sample().profile()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.keys().any(|k| k.contains("password")));
        assert_eq!(obj["name"], "Alice");
        assert_eq!(obj["email"], "alice@x.com");
    }
}
