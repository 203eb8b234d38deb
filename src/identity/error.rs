use tracing::error;

use crate::auth::{jwt::TokenError, password::CredentialError};
use crate::storage::StoreError;

/// Failure kinds surfaced by [`super::IdentityService`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("You don't have the {} role(s).", .missing.join(", "))]
    Forbidden { missing: Vec<String> },
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invalid token.")]
    InvalidToken,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Stable machine-readable code for the kind.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    /// Wraps a store failure that has no domain meaning for `op`.
    pub(crate) fn internal(op: &'static str, err: StoreError) -> Self {
        error!(error = %err, op, "store call failed");
        ApiError::Internal(err.into())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => ApiError::InvalidToken,
            TokenError::Encoding(e) => {
                error!(error = %e, "token signing failed");
                ApiError::Internal(e.into())
            }
            err @ TokenError::LifetimeOutOfRange(_) => ApiError::Internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_names_missing_roles() {
        let err = ApiError::Forbidden {
            missing: vec!["admin".into(), "auditor".into()],
        };
        assert_eq!(err.to_string(), "You don't have the admin, auditor role(s).");
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn credential_errors_become_invalid_argument() {
        let err: ApiError = CredentialError::InvalidArgument("bad salt".into()).into();
        assert!(matches!(err, ApiError::InvalidArgument(ref m) if m == "bad salt"));
    }

    #[test]
    fn unusable_token_lifetime_is_internal() {
        let err: ApiError =
            TokenError::LifetimeOutOfRange(std::time::Duration::from_secs(u64::MAX)).into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.code(), "INTERNAL");
    }
}
