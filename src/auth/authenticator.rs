//! Credential verification

use thiserror::Error;

use crate::auth::credentials::CredentialStore;
use crate::auth::models::Identity;

/// Authentication and authorization outcomes surfaced to callers.
///
/// Every variant is recoverable: the caller re-prompts for credentials or
/// shows the message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter both username and password")]
    InvalidInput,

    #[error("Invalid username")]
    UnknownUser,

    #[error("Invalid password")]
    BadPassword,

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Insufficient permissions")]
    InsufficientPermission,
}

/// Checks submitted credentials against a [`CredentialStore`].
///
/// `authenticate` has no side effects: committing the returned identity
/// into a [`Session`](crate::auth::Session) is the caller's job.
#[derive(Debug, Clone)]
pub struct Authenticator {
    store: CredentialStore,
}

impl Authenticator {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Verify a username/password pair.
    ///
    /// Empty fields are rejected before any lookup.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        let record = self.store.get(username).ok_or(AuthError::UnknownUser)?;

        if !record.verify(password) {
            return Err(AuthError::BadPassword);
        }

        Ok(Identity {
            username: record.username.clone(),
            display_name: record.display_name.clone(),
            role: record.role,
        })
    }
}
