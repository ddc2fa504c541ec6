//! Static API-key authentication for ledgerlens.
//!
//! This crate provides the credential side of request governance:
//!
//! - [`KeyStore`]: static keys merged from a single key, a comma list and a
//!   structured JSON list, indexed by blake3 digest
//! - [`AuthGuard`]: authentication (key → [`Credential`]) and role authorization
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│   AuthGuard      │
//! │   (governor)     │     │                  │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │   KeyStore       │
//!                          │  (digest index)  │
//!                          └────────┬─────────┘
//!                                   │ startup only
//!                          ┌────────▼─────────┐
//!                          │   KeySources     │
//!                          │   (environment)  │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ledgerlens_auth::{AuthGuard, KeySources, KeyStore, Role};
//!
//! let sources = KeySources {
//!     list: Some("abc123:admin:Owner,viewer-key:viewer".to_string()),
//!     ..KeySources::default()
//! };
//! let guard = AuthGuard::new(Arc::new(KeyStore::load(&sources)));
//!
//! let credential = guard.authenticate(Some("abc123")).unwrap();
//! assert_eq!(credential.role, Role::Admin);
//! assert!(guard.authorize(&credential, Role::Admin).is_ok());
//! assert!(guard.authenticate(Some("xyz")).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credential;
pub mod error;
pub mod guard;
pub mod keystore;

pub use credential::{token_suffix, Credential, Role};
pub use error::{AuthError, Result};
pub use guard::AuthGuard;
pub use keystore::{KeySources, KeyStore};
