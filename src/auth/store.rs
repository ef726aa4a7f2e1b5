//! Identity store with a persisted user blob.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use super::verifier::CredentialVerifier;
use super::{AuthError, User};

/// Holds the current identity and the login/logout operations.
///
/// Cloning is cheap; all clones share the same inner state. A successful
/// login writes the serialized user to the store file so the session
/// survives a restart; logout removes the file.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    verifier: Box<dyn CredentialVerifier>,
    store_path: PathBuf,
    user: RwLock<Option<User>>,
    /// True until the one-time startup restore has run.
    restoring: AtomicBool,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("store_path", &self.inner.store_path)
            .finish()
    }
}

impl AuthStore {
    /// Create a store with the given verifier and storage file path.
    ///
    /// The store starts in the restoring state; call [`AuthStore::restore`]
    /// before serving traffic that consults the guard.
    #[must_use]
    pub fn new(verifier: Box<dyn CredentialVerifier>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(AuthStoreInner {
                verifier,
                store_path: store_path.into(),
                user: RwLock::new(None),
                restoring: AtomicBool::new(true),
            }),
        }
    }

    /// Read the persisted user blob once and leave the restoring state.
    ///
    /// A missing or unreadable file means starting signed out; it is not
    /// an error.
    pub fn restore(&self) {
        match read_user(&self.inner.store_path) {
            Some(user) => {
                info!(
                    name: "auth.session.restored",
                    user_id = %user.id,
                    "Restored persisted session"
                );
                *self.inner.user.write().unwrap() = Some(user);
            }
            None => {
                *self.inner.user.write().unwrap() = None;
            }
        }
        self.inner.restoring.store(false, Ordering::SeqCst);
    }

    /// Whether the startup restore is still pending.
    #[must_use]
    pub fn is_restoring(&self) -> bool {
        self.inner.restoring.load(Ordering::SeqCst)
    }

    /// The currently authenticated user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.user.read().unwrap().clone()
    }

    /// Verify the pair against the allow-list and establish the identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on any mismatch.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .inner
            .verifier
            .verify(email, password)
            .ok_or(AuthError::InvalidCredentials)?;

        *self.inner.user.write().unwrap() = Some(user.clone());
        self.persist(&user);

        info!(name: "auth.login", user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Clear the identity and delete the persisted blob.
    pub fn logout(&self) {
        let previous = self.inner.user.write().unwrap().take();
        if let Some(user) = previous {
            info!(name: "auth.logout", user_id = %user.id, "User logged out");
        }
        if self.inner.store_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.inner.store_path) {
                warn!(
                    name: "auth.store.remove_failed",
                    error = %e,
                    "Failed to remove persisted session"
                );
            }
        }
    }

    /// Write the user blob. Persistence failures are logged, not surfaced:
    /// the in-memory login already succeeded.
    fn persist(&self, user: &User) {
        let json = match serde_json::to_vec(user) {
            Ok(json) => json,
            Err(e) => {
                warn!(name: "auth.store.encode_failed", error = %e, "Failed to encode session");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.inner.store_path, json) {
            warn!(
                name: "auth.store.write_failed",
                error = %e,
                "Failed to persist session"
            );
        }
    }
}

fn read_user(path: &Path) -> Option<User> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(
                name: "auth.store.decode_failed",
                error = %e,
                "Ignoring corrupt session file"
            );
            None
        }
    }
}
