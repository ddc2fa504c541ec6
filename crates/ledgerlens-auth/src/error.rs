//! Authentication error types.

use thiserror::Error;

use crate::credential::Role;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication and authorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No API key was presented, or the key is not in the key store.
    #[error("invalid api key")]
    Unauthenticated,

    /// The key is valid but its role does not grant access.
    #[error("role {actual} cannot access a route requiring {required}")]
    Forbidden {
        /// The role the route requires.
        required: Role,
        /// The role attached to the presented key.
        actual: Role,
    },

    /// A structured key list could not be parsed.
    #[error("invalid key list: {0}")]
    InvalidKeyList(String),
}

impl AuthError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden { .. } => 403,
            Self::InvalidKeyList(_) => 500,
        }
    }
}
