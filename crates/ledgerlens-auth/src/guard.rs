//! Admission decisions over the key store.

use std::sync::Arc;

use crate::credential::{Credential, Role};
use crate::error::{AuthError, Result};
use crate::keystore::KeyStore;

/// Turns presented tokens into credentials and checks role requirements.
///
/// Authentication and authorization are independent checks; callers run
/// [`AuthGuard::authenticate`] first so a missing key is always reported as
/// [`AuthError::Unauthenticated`], never as [`AuthError::Forbidden`].
#[derive(Debug, Clone)]
pub struct AuthGuard {
    keys: Arc<KeyStore>,
}

impl AuthGuard {
    /// Create a guard over a loaded key store.
    #[must_use]
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Resolve the presented token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the token is absent or unknown.
    pub fn authenticate(&self, token: Option<&str>) -> Result<Credential> {
        let token = token.ok_or(AuthError::Unauthenticated)?;
        self.keys
            .resolve(token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }

    /// Require an exact role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` if the credential carries a different role.
    pub fn authorize(&self, credential: &Credential, required: Role) -> Result<()> {
        if credential.role == required {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                required,
                actual: credential.role,
            })
        }
    }

    /// The underlying key store.
    #[must_use]
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }
}
