//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: bearer-token session with expiry, persisted next to the logs
//! - `TokenStore`: where tokens live between runs; `CredentialStore` is the
//!   OS keychain implementation (keyring)
//!
//! Tokens come from the identity provider and are valid for 60 minutes.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, TokenStore};
pub use session::{Session, SessionData};
