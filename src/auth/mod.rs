//! Authentication: credential verification and the identity store.
//!
//! Login checks a fixed allow-list through the [`CredentialVerifier`]
//! trait, so the mock table can be swapped for a real credential store
//! without touching callers. The logged-in [`User`] is persisted to a
//! single JSON file and restored once at startup, mirroring the
//! client-storage behavior of the original web client.

pub mod guard;
pub mod store;
pub mod verifier;

pub use guard::route_guard;
pub use store::AuthStore;
pub use verifier::{AllowList, CredentialVerifier};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier from the credential record.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Authentication failure.
///
/// Deliberately a single generic variant: a mismatched email and a
/// mismatched password are indistinguishable to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials did not match any allow-list record.
    #[error("invalid email or password")]
    InvalidCredentials,
}
