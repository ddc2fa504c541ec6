//! Static API-key store.
//!
//! Keys are loaded once at startup from up to three sources and never change
//! afterwards. Sources are merged in increasing precedence:
//!
//! 1. a single key (`APP_API_KEY`)
//! 2. a comma-separated list (`APP_API_KEYS`), entries `token[:role[:name]]`
//! 3. a structured JSON list (`APP_API_KEYS_JSON`)
//!
//! A later source replaces an earlier one when both define the same token.

use std::collections::HashMap;

use serde::Deserialize;

use crate::credential::{digest, Credential, Role};
use crate::error::{AuthError, Result};

/// Raw key configuration, usually read from the environment.
#[derive(Debug, Clone, Default)]
pub struct KeySources {
    /// A single key.
    pub single: Option<String>,
    /// Role for the single key. Defaults to [`Role::User`].
    pub single_role: Option<String>,
    /// Comma-separated keys.
    pub list: Option<String>,
    /// JSON array of `{"key", "role", "name"}` objects.
    pub structured: Option<String>,
}

impl KeySources {
    /// Read key sources from `APP_API_KEY`, `APP_API_KEY_ROLE`,
    /// `APP_API_KEYS` and `APP_API_KEYS_JSON`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            single: std::env::var("APP_API_KEY").ok(),
            single_role: std::env::var("APP_API_KEY_ROLE").ok(),
            list: std::env::var("APP_API_KEYS").ok(),
            structured: std::env::var("APP_API_KEYS_JSON").ok(),
        }
    }

    /// Returns `true` if no source is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.single, &self.list, &self.structured]
            .iter()
            .all(|s| s.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// One entry of the structured key list.
#[derive(Debug, Deserialize)]
struct KeyEntry {
    key: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Index of static API keys.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: HashMap<[u8; 32], Credential>,
}

impl KeyStore {
    /// Create an empty key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key store from explicit credentials. Later duplicates win.
    #[must_use]
    pub fn from_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let mut store = Self::new();
        for credential in credentials {
            store.insert(credential);
        }
        store
    }

    /// Load and merge all configured sources.
    ///
    /// A malformed structured list is logged and skipped; the simpler sources
    /// are still loaded.
    #[must_use]
    pub fn load(sources: &KeySources) -> Self {
        let mut store = Self::new();

        if let Some(token) = sources.single.as_deref().map(str::trim) {
            if !token.is_empty() {
                let role = sources
                    .single_role
                    .as_deref()
                    .map_or(Role::User, parse_role);
                store.insert(Credential::new(token, role, None));
            }
        }

        if let Some(list) = sources.list.as_deref() {
            for credential in parse_list(list) {
                store.insert(credential);
            }
        }

        if let Some(raw) = sources.structured.as_deref() {
            match parse_structured(raw) {
                Ok(credentials) => {
                    for credential in credentials {
                        store.insert(credential);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed structured key list");
                }
            }
        }

        tracing::info!(keys = store.len(), "Key store loaded");
        store
    }

    /// Insert a credential, replacing any with the same token.
    pub fn insert(&mut self, credential: Credential) {
        self.keys.insert(credential.digest_bytes(), credential);
    }

    /// Resolve a token to its credential.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&Credential> {
        self.keys
            .get(digest(token).as_bytes())
            .filter(|credential| credential.matches(token))
    }

    /// Number of loaded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over loaded credentials.
    pub fn credentials(&self) -> impl Iterator<Item = &Credential> {
        self.keys.values()
    }
}

fn parse_role(raw: &str) -> Role {
    raw.parse().unwrap_or_else(|e: String| {
        tracing::warn!(error = %e, "Falling back to user role");
        Role::User
    })
}

/// Parse `token[:role[:name]]` entries separated by commas.
fn parse_list(list: &str) -> Vec<Credential> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let token = parts.next()?.trim();
            if token.is_empty() {
                return None;
            }
            let role = parts.next().map_or(Role::User, parse_role);
            let name = parts.next().map(|n| n.trim().to_string());
            Some(Credential::new(token, role, name))
        })
        .collect()
}

/// Parse the structured JSON key list.
///
/// # Errors
///
/// Returns `AuthError::InvalidKeyList` if the input is not a JSON array of entries.
pub fn parse_structured(raw: &str) -> Result<Vec<Credential>> {
    let entries: Vec<KeyEntry> =
        serde_json::from_str(raw).map_err(|e| AuthError::InvalidKeyList(e.to_string()))?;

    Ok(entries
        .into_iter()
        .filter(|entry| !entry.key.trim().is_empty())
        .map(|entry| {
            let role = entry.role.as_deref().map_or(Role::User, parse_role);
            Credential::new(entry.key.trim(), role, entry.name)
        })
        .collect())
}
