//! Credentials and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access level attached to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including administrative routes.
    Admin,
    /// Regular API access.
    #[default]
    User,
    /// Read-oriented access.
    Viewer,
}

impl Role {
    /// Lowercase name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A resolved API key.
///
/// The raw token is never retained; only its blake3 digest is kept for
/// comparison, plus the last four characters for audit trails.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    digest: blake3::Hash,
    suffix: String,
    /// Role granted to the key.
    pub role: Role,
    /// Human-readable name of the key holder.
    pub name: String,
}

impl Credential {
    /// Build a credential from a raw token.
    ///
    /// When `name` is `None` the display name is derived from the token suffix.
    #[must_use]
    pub fn new(token: &str, role: Role, name: Option<String>) -> Self {
        let suffix = token_suffix(token);
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("key-{suffix}"));
        Self {
            digest: digest(token),
            suffix,
            role,
            name,
        }
    }

    /// Constant-time check that `token` is this credential's secret.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        // blake3::Hash equality is constant-time
        self.digest == digest(token)
    }

    /// Last four characters of the token.
    #[must_use]
    pub fn token_suffix(&self) -> &str {
        &self.suffix
    }

    /// Hex digest of the token, safe to persist.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex().to_string()
    }

    pub(crate) fn digest_bytes(&self) -> [u8; 32] {
        *self.digest.as_bytes()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("suffix", &self.suffix)
            .field("role", &self.role)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Hash a token for storage and lookup.
#[must_use]
pub fn digest(token: &str) -> blake3::Hash {
    blake3::hash(token.as_bytes())
}

/// Last four characters of a token, or the whole token when shorter.
#[must_use]
pub fn token_suffix(token: &str) -> String {
    let count = token.chars().count();
    token.chars().skip(count.saturating_sub(4)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Viewer ".parse::<Role>().unwrap(), Role::Viewer);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn suffix_of_short_and_long_tokens() {
        assert_eq!(token_suffix("abc123"), "c123");
        assert_eq!(token_suffix("xyz"), "xyz");
        assert_eq!(token_suffix(""), "");
    }

    #[test]
    fn credential_matches_only_its_token() {
        let cred = Credential::new("abc123", Role::Admin, None);
        assert!(cred.matches("abc123"));
        assert!(!cred.matches("abc124"));
        assert_eq!(cred.name, "key-c123");
        assert_eq!(cred.token_suffix(), "c123");
    }

    #[test]
    fn digest_hex_is_stable_and_hides_token() {
        let a = Credential::new("abc123", Role::User, None);
        let b = Credential::new("abc123", Role::Admin, Some("other".into()));
        assert_eq!(a.digest_hex(), b.digest_hex());
        assert_eq!(a.digest_hex().len(), 64);
        assert!(!a.digest_hex().contains("abc123"));
    }

    #[test]
    fn debug_does_not_leak_token() {
        let cred = Credential::new("super-secret-token", Role::User, Some("ops".into()));
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("oken"));
    }
}
