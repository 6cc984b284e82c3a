use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use emoney_core::{AccountId, AuthError, Email};

/// Issuer stamped into every token.
pub const ISSUER: &str = "account-service";

/// Tolerated clock difference between the issuing and the verifying service.
fn clock_skew() -> Duration {
    Duration::seconds(30)
}

/// Verified bearer-token payload.
///
/// This is a capability, not an entity: it is produced by token issuance,
/// reconstructed by verification, and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClaims {
    #[serde(rename = "id")]
    pub account_id: AccountId,

    pub email: Email,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(rename = "iss")]
    pub issuer: String,
}

/// Deterministically validate decoded claims against `now`.
///
/// Signature verification happens before this, in the token service.
pub fn validate_claims(claims: &AccountClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.issuer != ISSUER {
        return Err(AuthError::Malformed);
    }
    if claims.expires_at <= claims.issued_at {
        return Err(AuthError::Malformed);
    }
    if claims.issued_at > now + clock_skew() {
        return Err(AuthError::Malformed);
    }
    if now > claims.expires_at {
        return Err(AuthError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> AccountClaims {
        AccountClaims {
            account_id: AccountId::new(),
            email: Email::parse("alice@x.com").unwrap(),
            issued_at,
            expires_at: issued_at + ttl,
            issuer: ISSUER.to_string(),
        }
    }

    #[test]
    fn fresh_claims_pass() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims(now, Duration::hours(1)), now), Ok(()));
    }

    #[test]
    fn expiry_is_strictly_after_expires_at() {
        let now = Utc::now();
        let c = claims(now - Duration::hours(1), Duration::hours(1));
        assert_eq!(validate_claims(&c, c.expires_at), Ok(()));
        assert_eq!(
            validate_claims(&c, c.expires_at + Duration::seconds(1)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn inverted_window_and_foreign_issuer_are_malformed() {
        let now = Utc::now();
        let inverted = claims(now, Duration::seconds(-5));
        assert_eq!(validate_claims(&inverted, now), Err(AuthError::Malformed));

        let mut foreign = claims(now, Duration::hours(1));
        foreign.issuer = "someone-else".to_string();
        assert_eq!(validate_claims(&foreign, now), Err(AuthError::Malformed));
    }

    #[test]
    fn issued_in_the_future_beyond_skew_is_malformed() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(5), Duration::hours(1));
        assert_eq!(validate_claims(&c, now), Err(AuthError::Malformed));
    }

    #[test]
    fn wire_names_match_registered_claims() {
        let json = serde_json::to_value(claims(Utc::now(), Duration::hours(1))).unwrap();
        for key in ["id", "email", "iat", "exp", "iss"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["exp"].is_i64());
    }

    proptest! {
        /// Claims are accepted up to and including `exp`, and expired after it.
        #[test]
        fn expiry_boundary(ttl_secs in 1i64..86_400, elapsed_secs in 0i64..172_800) {
            let issued = Utc::now();
            let c = claims(issued, Duration::seconds(ttl_secs));
            let result = validate_claims(&c, issued + Duration::seconds(elapsed_secs));

            if elapsed_secs > ttl_secs {
                prop_assert_eq!(result, Err(AuthError::Expired));
            } else {
                prop_assert_eq!(result, Ok(()));
            }
        }
    }
}
