//! Mail provider trait definition.
//!
//! This module defines the [`MailProvider`] trait which abstracts the
//! remote mailbox API consumed by the scan, unsubscribe, and trash
//! services. The only shipped implementation is the Gmail REST provider,
//! but the services depend solely on this seam, which keeps them
//! testable with a mocked provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type alias for mail provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Upper bound on identifiers per batch label mutation, imposed by the
/// provider's batchModify endpoint.
pub const MAX_BATCH_MODIFY_IDS: usize = 1000;

/// Errors that can occur during mail provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// One page of message identifiers from the provider's search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageIdPage {
    /// Message identifiers on this page.
    pub ids: Vec<String>,
    /// Continuation token for the next page, if more results exist.
    pub next_page_token: Option<String>,
}

/// A single message header as returned by a metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Header name, e.g. `From`.
    pub name: String,
    /// Raw header value.
    pub value: String,
}

/// Metadata for one message, restricted to the requested headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Provider-assigned message identifier.
    pub id: String,
    /// The requested headers that were present on the message.
    pub headers: Vec<MessageHeader>,
}

impl MessageMetadata {
    /// Returns the value of the named header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Trait for the remote mailbox API.
///
/// All methods are async I/O boundaries. Implementations hold whatever
/// credentials they need; the services never read ambient session state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists message identifiers matching a search query.
    ///
    /// # Arguments
    ///
    /// * `query` - Provider search predicate, e.g. `label:inbox newer_than:90d`
    /// * `page_token` - Continuation token from a previous page, if any
    async fn list_message_ids<'a>(
        &self,
        query: &str,
        page_token: Option<&'a str>,
    ) -> Result<MessageIdPage>;

    /// Fetches only the named metadata headers for one message.
    async fn get_message_metadata(
        &self,
        id: &str,
        header_names: &[&'static str],
    ) -> Result<MessageMetadata>;

    /// Adds a label to a batch of messages.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidRequest`] if `ids` exceeds
    /// [`MAX_BATCH_MODIFY_IDS`].
    async fn batch_add_label(&self, ids: &[String], label: &str) -> Result<()>;

    /// Sends a raw RFC 5322 message, already base64url-encoded.
    ///
    /// # Returns
    ///
    /// The message ID assigned by the provider.
    async fn send_raw_message(&self, raw_base64url: &str) -> Result<String>;
}
