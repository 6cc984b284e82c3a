//! Value objects: compared by value, validated on construction.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A normalized (trimmed, lower-cased) email address.
///
/// Uniqueness is enforced by the store of record on this normalized form, so
/// `Alice@X.com` and `alice@x.com` collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let normalized = raw.trim().to_lowercase();

        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| ServiceError::validation("email must contain '@'"))?;

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(ServiceError::validation("email is malformed"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(ServiceError::validation("email must not contain whitespace"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Monetary amount in minor units (cents). Never negative.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Result<Self, ServiceError> {
        if minor < 0 {
            return Err(ServiceError::validation("monetary amount must not be negative"));
        }
        Ok(Self(minor))
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Money {
    type Error = ServiceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_minor(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}
