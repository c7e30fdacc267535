//! Mail provider implementations.
//!
//! This module contains the [`MailProvider`] trait and the Gmail REST
//! implementation. The trait covers exactly the four remote operations
//! the core needs: message-id search with continuation tokens,
//! metadata-only message fetches, batch label mutation, and raw message
//! sending.

mod gmail;
mod traits;

pub use gmail::{GmailOauth, GmailProvider, GMAIL_SCOPES};
pub use traits::{
    MailProvider, MessageHeader, MessageIdPage, MessageMetadata, ProviderError, Result,
    MAX_BATCH_MODIFY_IDS,
};

#[cfg(test)]
pub use traits::MockMailProvider;

/// Gmail system label that moves a message to the trash.
pub const TRASH_LABEL: &str = "TRASH";
