//! Mail provider credential storage.
//!
//! The [`CredentialStore`] trait is the seam between the core and
//! whatever persists OAuth tokens. The shipped implementation stores the
//! token set as JSON in the OS keychain via [`KeychainAccess`]. A user
//! with no stored tokens surfaces as [`CredentialError::NotConnected`],
//! a distinct condition so callers can prompt for a reconnect instead of
//! showing a generic error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keychain::{KeychainAccess, KeychainError};
use crate::domain::UserId;

/// Errors that can occur during credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The user has no mail connection on file.
    #[error("no mail connection for user {0}")]
    NotConnected(UserId),

    /// The stored token payload could not be decoded.
    #[error("invalid stored credentials: {0}")]
    Invalid(String),

    /// The underlying storage failed.
    #[error("credential storage error: {0}")]
    Storage(String),
}

impl From<KeychainError> for CredentialError {
    fn from(e: KeychainError) -> Self {
        CredentialError::Storage(e.to_string())
    }
}

/// Result type for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;

/// An OAuth token set for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailCredentials {
    /// Short-lived access token presented on API calls.
    pub access_token: String,
    /// Long-lived refresh token used to mint new access tokens.
    pub refresh_token: String,
    /// When the access token expires.
    pub expiry: DateTime<Utc>,
    /// Space-separated OAuth scopes granted to the tokens.
    pub scope: String,
}

impl MailCredentials {
    /// Returns true if the access token has expired (with a small margin
    /// so a token about to lapse is not used mid-operation).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now + chrono::Duration::seconds(30)
    }
}

/// Trait for credential persistence backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetches the stored token set for a user.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NotConnected`] if the user has no
    /// tokens on file.
    async fn get(&self, user_id: &UserId) -> Result<MailCredentials>;

    /// Stores (or replaces) the token set for a user.
    async fn put(&self, user_id: &UserId, credentials: &MailCredentials) -> Result<()>;

    /// Removes the stored token set for a user, disconnecting them.
    async fn remove(&self, user_id: &UserId) -> Result<()>;
}

/// Credential store backed by the OS keychain.
#[derive(Debug, Clone, Default)]
pub struct KeychainCredentialStore {
    keychain: KeychainAccess,
}

impl KeychainCredentialStore {
    /// Creates a store using the default keychain service name.
    pub fn new() -> Self {
        Self {
            keychain: KeychainAccess::new(),
        }
    }

    /// Creates a store over a specific keychain accessor.
    pub fn with_keychain(keychain: KeychainAccess) -> Self {
        Self { keychain }
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn get(&self, user_id: &UserId) -> Result<MailCredentials> {
        let key = KeychainAccess::mail_tokens_key(&user_id.0);
        let payload = self
            .keychain
            .retrieve(&key)
            .await?
            .ok_or_else(|| CredentialError::NotConnected(user_id.clone()))?;

        serde_json::from_str(&payload).map_err(|e| CredentialError::Invalid(e.to_string()))
    }

    async fn put(&self, user_id: &UserId, credentials: &MailCredentials) -> Result<()> {
        let key = KeychainAccess::mail_tokens_key(&user_id.0);
        let payload = serde_json::to_string(credentials)
            .map_err(|e| CredentialError::Invalid(e.to_string()))?;
        self.keychain.store(&key, &payload).await?;
        Ok(())
    }

    async fn remove(&self, user_id: &UserId) -> Result<()> {
        let key = KeychainAccess::mail_tokens_key(&user_id.0);
        match self.keychain.delete(&key).await {
            Ok(()) => Ok(()),
            Err(KeychainError::NotFound(_)) => {
                Err(CredentialError::NotConnected(user_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
