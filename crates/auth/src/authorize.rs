//! Resource-level authorization.
//!
//! Authentication answers "who is calling"; this answers "may they touch
//! this account". The two fail differently (`Unauthenticated` vs
//! `PermissionDenied`).

use emoney_core::{AccountId, AuthError};

use crate::AccountClaims;

/// An account's data may only be read or debited by its owner.
///
/// - No IO
/// - No panics
pub fn authorize_account_access(
    claims: &AccountClaims,
    requested: AccountId,
) -> Result<(), AuthError> {
    if claims.account_id == requested {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use emoney_core::Email;

    fn claims_for(id: AccountId) -> AccountClaims {
        let now = Utc::now();
        AccountClaims {
            account_id: id,
            email: Email::parse("a@x.com").unwrap(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
            issuer: crate::ISSUER.to_string(),
        }
    }

    #[test]
    fn owner_is_allowed() {
        let a = AccountId::new();
        assert_eq!(authorize_account_access(&claims_for(a), a), Ok(()));
    }

    #[test]
    fn other_account_is_permission_denied() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(
            authorize_account_access(&claims_for(a), b),
            Err(AuthError::PermissionDenied)
        );
    }
}
