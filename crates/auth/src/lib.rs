//! `emoney-auth` — credentials, bearer tokens and resource-level access checks.
//!
//! Transport-agnostic: nothing here knows about HTTP or storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod token;

pub use authorize::authorize_account_access;
pub use claims::{AccountClaims, ISSUER, validate_claims};
pub use password::{PasswordError, PasswordHasher, validate_password};
pub use token::{Hs256TokenService, TokenValidator, extract_bearer};
