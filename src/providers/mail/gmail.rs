//! Gmail API provider implementation.
//!
//! This module provides a [`MailProvider`] implementation using the Gmail
//! REST API. It handles OAuth 2.0 token refresh, message-id listing via
//! search queries, metadata-only message fetches, batch label mutations,
//! and raw message sending.
//!
//! # Authentication
//!
//! The provider is constructed with an explicit [`MailCredentials`] token
//! set; no ambient session state is read. [`authenticate`](GmailProvider::authenticate)
//! refreshes the access token against the Google token endpoint when the
//! stored expiry has passed, and the possibly-refreshed credentials are
//! exposed for the caller to persist back to its store.
//!
//! # API usage
//!
//! Gmail API v1:
//! - `users.messages.list` for message-id search with continuation tokens
//! - `users.messages.get` with `format=metadata` for header-only fetches
//! - `users.messages.batchModify` for label mutations (≤ 1000 ids)
//! - `users.messages.send` for raw outbound mail

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{
    MailProvider, MessageHeader, MessageIdPage, MessageMetadata, ProviderError, Result,
    MAX_BATCH_MODIFY_IDS,
};
use crate::storage::MailCredentials;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Page size requested from `users.messages.list`.
const LIST_PAGE_SIZE: u32 = 500;

/// OAuth scopes required for scan, unsubscribe, and trash operations.
pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
];

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<GmailMessageRef>>,
    next_page_token: Option<String>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

/// Gmail API message reference (id-only list entry).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageRef {
    id: Option<String>,
    #[allow(dead_code)]
    thread_id: Option<String>,
}

/// Gmail API message as returned by a metadata-format fetch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMetadataMessage {
    id: String,
    payload: Option<GmailMessagePayload>,
}

/// Gmail message payload (headers only in metadata format).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessagePayload {
    headers: Option<Vec<GmailHeader>>,
}

/// Gmail message header.
#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail batchModify request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchModifyRequest {
    ids: Vec<String>,
    add_label_ids: Vec<String>,
    remove_label_ids: Vec<String>,
}

/// Gmail send request body (raw base64url MIME).
#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

/// Gmail send response.
#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// OAuth token refresh response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// OAuth client registration used for token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailOauth {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

/// Gmail API provider.
///
/// Implements [`MailProvider`] against the Gmail REST API.
///
/// # Example
///
/// ```ignore
/// use sweep::providers::mail::{GmailOauth, GmailProvider, MailProvider};
///
/// let mut provider = GmailProvider::new(oauth, credentials);
/// provider.authenticate().await?;
///
/// let page = provider.list_message_ids("label:inbox newer_than:90d", None).await?;
/// ```
pub struct GmailProvider {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// OAuth client registration for token refresh.
    oauth: GmailOauth,
    /// Token set; access token and expiry are replaced on refresh.
    credentials: MailCredentials,
    /// Whether authenticate has run for this provider.
    authenticated: bool,
}

impl GmailProvider {
    /// Creates a new Gmail provider over an explicit token set.
    ///
    /// The provider is not usable until [`authenticate`](Self::authenticate)
    /// is called.
    pub fn new(oauth: GmailOauth, credentials: MailCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            oauth,
            credentials,
            authenticated: false,
        }
    }

    /// Returns whether the provider is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns the current token set, which may have been refreshed since
    /// construction. Callers persist this back to their credential store.
    pub fn credentials(&self) -> &MailCredentials {
        &self.credentials
    }

    /// Verifies the token set is usable, refreshing the access token if
    /// the stored expiry has passed.
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.credentials.is_expired(Utc::now()) {
            self.refresh_access_token().await?;
        }
        self.authenticated = true;

        tracing::debug!("Gmail provider authenticated");
        Ok(())
    }

    /// Refreshes the OAuth access token using the refresh token.
    async fn refresh_access_token(&mut self) -> Result<()> {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse token response: {}", e)))?;

        self.credentials.access_token = token.access_token;
        self.credentials.expiry = Utc::now() + chrono::Duration::seconds(token.expires_in);

        tracing::info!("Gmail access token refreshed");
        Ok(())
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        if !self.authenticated {
            return Err(ProviderError::Authentication(
                "not authenticated".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.credentials.access_token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Percent-encodes a value for use in a query string.
    fn encode_query(value: &str) -> String {
        url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let headers = self.auth_headers()?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Makes an authenticated POST request to the Gmail API.
    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Makes an authenticated POST request that doesn't return a body.
    async fn post_no_response<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }
        Ok(())
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited {
                retry_after_secs: None,
            },
            _ => ProviderError::Internal(format!("API error ({}): {}", status, body)),
        }
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    async fn list_message_ids<'a>(
        &self,
        query: &str,
        page_token: Option<&'a str>,
    ) -> Result<MessageIdPage> {
        let mut endpoint = format!(
            "/messages?maxResults={}&q={}",
            LIST_PAGE_SIZE,
            Self::encode_query(query)
        );
        if let Some(token) = page_token {
            endpoint.push_str(&format!("&pageToken={}", Self::encode_query(token)));
        }

        let response: MessageListResponse = self.get(&endpoint).await?;

        // List entries without an id cannot be fetched; drop them at the
        // boundary rather than crashing downstream.
        let ids = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();

        Ok(MessageIdPage {
            ids,
            next_page_token: response.next_page_token,
        })
    }

    async fn get_message_metadata(
        &self,
        id: &str,
        header_names: &[&'static str],
    ) -> Result<MessageMetadata> {
        let mut endpoint = format!("/messages/{}?format=metadata", Self::encode_query(id));
        for name in header_names {
            endpoint.push_str(&format!("&metadataHeaders={}", Self::encode_query(name)));
        }

        let response: GmailMetadataMessage = self.get(&endpoint).await?;

        let headers = response
            .payload
            .and_then(|p| p.headers)
            .unwrap_or_default()
            .into_iter()
            .map(|h| MessageHeader {
                name: h.name,
                value: h.value,
            })
            .collect();

        Ok(MessageMetadata {
            id: response.id,
            headers,
        })
    }

    async fn batch_add_label(&self, ids: &[String], label: &str) -> Result<()> {
        if ids.len() > MAX_BATCH_MODIFY_IDS {
            return Err(ProviderError::InvalidRequest(format!(
                "batchModify accepts at most {} ids, got {}",
                MAX_BATCH_MODIFY_IDS,
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(());
        }

        let body = BatchModifyRequest {
            ids: ids.to_vec(),
            add_label_ids: vec![label.to_string()],
            remove_label_ids: vec![],
        };

        self.post_no_response("/messages/batchModify", &body).await
    }

    async fn send_raw_message(&self, raw_base64url: &str) -> Result<String> {
        let response: SendResponse = self
            .post(
                "/messages/send",
                &SendRequest {
                    raw: raw_base64url.to_string(),
                },
            )
            .await?;

        tracing::info!(message_id = %response.id, "message sent via Gmail API");
        Ok(response.id)
    }
}
