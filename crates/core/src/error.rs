//! Service error taxonomy shared by both services.

use thiserror::Error;

/// Boxed underlying cause of an infrastructure failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used across the service layers.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Authentication/authorization failure.
///
/// Kept distinct from validation and not-found so clients can tell
/// "fix your input" apart from "fix your credentials".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credential was presented for a protected operation.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The caller is authenticated but may not touch the requested resource.
    #[error("permission denied")]
    PermissionDenied,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    /// Bad MAC, or a signing algorithm other than the expected symmetric one.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Unknown email or wrong password (never says which).
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Error returned by stores, publishers and orchestrators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input was rejected (malformed id, bad amount, ...). Not retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Uniqueness violated (duplicate email). Not retried.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Store, cache, broker or index unreachable or erroring.
    #[error("infrastructure failure: {context}")]
    Infrastructure {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn infrastructure(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Infrastructure {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether this error came from a collaborator rather than from the caller.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Infrastructure { .. })
    }

    pub fn auth_kind(&self) -> Option<AuthError> {
        match self {
            Self::Auth(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn infrastructure_keeps_underlying_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "redis down");
        let err = ServiceError::infrastructure("cache get", io);

        assert!(err.is_infrastructure());
        assert_eq!(err.to_string(), "infrastructure failure: cache get");
        assert_eq!(err.source().unwrap().to_string(), "redis down");
    }

    #[test]
    fn auth_errors_convert_and_stay_inspectable() {
        let err: ServiceError = AuthError::PermissionDenied.into();
        assert_eq!(err.auth_kind(), Some(AuthError::PermissionDenied));
        assert_eq!(ServiceError::conflict("x").auth_kind(), None);
    }
}
