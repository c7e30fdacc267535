//! Credential storage.
//!
//! OAuth tokens for the mail provider live in the OS keychain, behind
//! the [`CredentialStore`] trait so services never touch the keychain
//! directly.

mod credentials;
mod keychain;

pub use credentials::{
    CredentialError, CredentialStore, KeychainCredentialStore, MailCredentials,
};
pub use keychain::{KeychainAccess, KeychainError};

#[cfg(test)]
pub use credentials::MockCredentialStore;
