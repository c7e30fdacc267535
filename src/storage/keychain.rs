//! Keychain access for secure credential storage.
//!
//! Wraps the keyring crate to provide OS-native credential storage.

use thiserror::Error;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Provides access to the OS keychain for credential storage.
///
/// Entries are namespaced by service name, allowing one stored credential
/// per user per service.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Default service name for sweep credentials.
    pub const DEFAULT_SERVICE: &'static str = "io.sweep.app";

    /// Creates a new KeychainAccess with the default service name.
    pub fn new() -> Self {
        Self {
            service_name: Self::DEFAULT_SERVICE.to_string(),
        }
    }

    /// Creates a new KeychainAccess with a custom service name.
    ///
    /// Useful for testing to avoid interfering with real credentials.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Stores a credential in the keychain.
    ///
    /// If a credential with the same key already exists, it is overwritten.
    pub async fn store(&self, key: &str, value: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            entry.set_password(&value)?;
            Ok(())
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Retrieves a credential from the keychain.
    ///
    /// Returns `None` if no credential exists for the key.
    pub async fn retrieve(&self, key: &str) -> Result<Option<String>> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            match entry.get_password() {
                Ok(password) => Ok(Some(password)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Deletes a credential from the keychain.
    ///
    /// Returns an error if the credential does not exist.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            match entry.delete_credential() {
                Ok(()) => Ok(()),
                Err(keyring::Error::NoEntry) => Err(KeychainError::NotFound(key)),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Returns the service name used for this keychain access.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Generates a keychain key for a user's mail provider tokens.
    pub fn mail_tokens_key(user_id: &str) -> String {
        format!("mail.tokens.{}", user_id)
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}
