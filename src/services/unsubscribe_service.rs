//! Unsubscribe execution and multi-sender sequencing.
//!
//! One invocation of [`UnsubscribeService::unsubscribe`] works through a
//! parsed directive set with first-success-wins semantics: every HTTP
//! candidate is tried (GET, then POST) before any mailto candidate, and
//! at most one side effect ever succeeds per call. Multi-sender runs go
//! through [`UnsubscribeService::unsubscribe_many`], which serializes
//! dispatches with a fixed delay to stay under upstream anti-abuse
//! limits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;
use thiserror::Error;

use crate::config::UnsubscribeSettings;
use crate::domain::{
    parse_list_unsubscribe, ActionKind, ActionMethod, ActionResult, MailtoDirective, UserId,
};
use crate::providers::mail::MailProvider;
use crate::services::audit::{record_or_warn, AuditEvent, AuditSink};

/// Error from an HTTP unsubscribe attempt.
#[derive(Debug, Error)]
#[error("unsubscribe transport error: {0}")]
pub struct TransportError(pub String);

/// Outbound HTTP seam for unsubscribe attempts.
///
/// Returns whether the endpoint indicated success (a 2xx status).
/// Keeping this behind a trait makes the GET-then-POST-then-mailto
/// fallback order a testable contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnsubscribeTransport: Send + Sync {
    /// Issues a GET to an unsubscribe URL.
    async fn get(&self, url: &str) -> Result<bool, TransportError>;

    /// Issues a POST with an empty body to an unsubscribe URL.
    async fn post(&self, url: &str) -> Result<bool, TransportError>;
}

/// [`UnsubscribeTransport`] backed by a reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a fresh client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnsubscribeTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<bool, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn post(&self, url: &str) -> Result<bool, TransportError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

/// Outcome of one unsubscribe invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsubscribeOutcome {
    /// Whether any candidate succeeded.
    pub success: bool,
    /// Mechanism that succeeded, if one did.
    pub method: Option<ActionMethod>,
}

impl UnsubscribeOutcome {
    fn failure() -> Self {
        Self {
            success: false,
            method: None,
        }
    }
}

/// One sender selected for a multi-sender unsubscribe run.
#[derive(Debug, Clone)]
pub struct UnsubscribeSelection {
    /// Display name, for the audit record.
    pub sender: String,
    /// Normalized sender address.
    pub from_email: String,
    /// Raw `List-Unsubscribe` header carried from the scan, if any.
    pub directive_header: Option<String>,
}

/// Service that executes unsubscribe actions.
pub struct UnsubscribeService {
    user_id: UserId,
    transport: Arc<dyn UnsubscribeTransport>,
    provider: Arc<dyn MailProvider>,
    sink: Arc<dyn AuditSink>,
    settings: UnsubscribeSettings,
}

impl UnsubscribeService {
    /// Creates an unsubscribe service.
    ///
    /// The provider is only used for the mailto fallback (sending the
    /// unsubscribe email); HTTP attempts go through the transport.
    pub fn new(
        user_id: UserId,
        transport: Arc<dyn UnsubscribeTransport>,
        provider: Arc<dyn MailProvider>,
        sink: Arc<dyn AuditSink>,
        settings: UnsubscribeSettings,
    ) -> Self {
        Self {
            user_id,
            transport,
            provider,
            sink,
            settings,
        }
    }

    /// Executes one unsubscribe against a raw directive header.
    ///
    /// HTTP candidates are tried first, in header order, GET before POST
    /// per candidate; mailto candidates are only reached if no HTTP
    /// attempt succeeded. Individual network failures are logged and the
    /// next candidate is tried. An empty directive set reports failure
    /// without any network call.
    pub async fn unsubscribe(&self, directive_header: &str) -> UnsubscribeOutcome {
        let directives = parse_list_unsubscribe(directive_header);

        for directive in directives.iter().filter(|d| d.is_http()) {
            match self.transport.get(&directive.value).await {
                Ok(true) => {
                    tracing::info!(url = %directive.value, "unsubscribed via HTTP GET");
                    return UnsubscribeOutcome {
                        success: true,
                        method: Some(ActionMethod::Http),
                    };
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(url = %directive.value, error = %e, "GET attempt failed"),
            }

            match self.transport.post(&directive.value).await {
                Ok(true) => {
                    tracing::info!(url = %directive.value, "unsubscribed via HTTP POST");
                    return UnsubscribeOutcome {
                        success: true,
                        method: Some(ActionMethod::Http),
                    };
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(url = %directive.value, error = %e, "POST attempt failed"),
            }
        }

        for directive in directives.iter().filter(|d| d.is_mailto()) {
            let Some(mailto) = MailtoDirective::parse(&directive.value) else {
                tracing::warn!(uri = %directive.value, "unparseable mailto directive");
                continue;
            };

            let raw = build_unsubscribe_message(&mailto);
            let encoded = BASE64_URL_SAFE_NO_PAD.encode(raw.as_bytes());

            match self.provider.send_raw_message(&encoded).await {
                Ok(id) => {
                    tracing::info!(to = %mailto.to, message_id = %id, "unsubscribed via mailto");
                    return UnsubscribeOutcome {
                        success: true,
                        method: Some(ActionMethod::Mailto),
                    };
                }
                Err(e) => tracing::warn!(to = %mailto.to, error = %e, "mailto send failed"),
            }
        }

        UnsubscribeOutcome::failure()
    }

    /// Executes unsubscribes for a selection of senders, one at a time.
    ///
    /// Dispatches are strictly sequential with a fixed delay after each,
    /// bounding throughput against upstream rate limiters. The returned
    /// results preserve the caller's selection order, and one audit
    /// event is emitted per sender.
    pub async fn unsubscribe_many(
        &self,
        selections: &[UnsubscribeSelection],
    ) -> Vec<ActionResult> {
        let delay = Duration::from_millis(self.settings.throttle_delay_ms);
        let mut results = Vec::with_capacity(selections.len());

        for selection in selections {
            let outcome = match &selection.directive_header {
                Some(header) => self.unsubscribe(header).await,
                None => UnsubscribeOutcome::failure(),
            };

            let result = ActionResult {
                sender: selection.sender.clone(),
                from_email: selection.from_email.clone(),
                action: ActionKind::Unsubscribe,
                success: outcome.success,
                method: outcome.method,
                affected_count: 0,
            };

            record_or_warn(
                self.sink.as_ref(),
                AuditEvent::from_result(&self.user_id, &result),
            )
            .await;
            results.push(result);

            tokio::time::sleep(delay).await;
        }

        results
    }
}

/// Builds the minimal plain-text unsubscribe email for a mailto target.
fn build_unsubscribe_message(mailto: &MailtoDirective) -> String {
    format!(
        "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=us-ascii\r\n\r\n{}",
        mailto.to, mailto.subject, mailto.body
    )
}
