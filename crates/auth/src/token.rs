//! HS256 bearer tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use tracing::debug;

use emoney_core::{AccountId, AuthError, Email, ServiceError};

use crate::claims::{AccountClaims, ISSUER, validate_claims};

/// Verifies a bearer token and yields its claims.
///
/// `now` is injected so expiry decisions are deterministic under test.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccountClaims, AuthError>;
}

/// Symmetric-key (HMAC-SHA256) token issuer and validator.
#[derive(Clone)]
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Hs256TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `account_id`, valid from `now` for the configured TTL.
    pub fn issue(
        &self,
        account_id: AccountId,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        // Whole seconds, so the decoded claims equal the issued ones.
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            ServiceError::infrastructure("token signing", "token ttl overflows the expiry time")
        })?;
        let claims = AccountClaims {
            account_id,
            email: email.clone(),
            issued_at,
            expires_at,
            issuer: ISSUER.to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::infrastructure("token signing", e))
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the injected clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);
        validation
    }
}

impl TokenValidator for Hs256TokenService {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccountClaims, AuthError> {
        let alg = header_algorithm(token)?;
        if alg != "HS256" {
            debug!(%alg, "token signed with unexpected algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let data = jsonwebtoken::decode::<AccountClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                map_jwt_error(e.kind())
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
}

/// The header's `alg` exactly as written. Read by hand because
/// `jsonwebtoken::decode_header` refuses names it does not know (`none`).
fn header_algorithm(token: &str) -> Result<String, AuthError> {
    let segment = token.split('.').next().unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        debug!(error = %e, "token header is not base64url");
        AuthError::Malformed
    })?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|e| {
        debug!(error = %e, "token header is not json");
        AuthError::Malformed
    })?;
    header.alg.ok_or(AuthError::Malformed)
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Malformed,
    }
}

/// Pull the token out of an `authorization` value of the form `Bearer <token>`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::Unauthenticated)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }
    Ok(token)
}
