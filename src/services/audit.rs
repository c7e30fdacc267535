//! Audit event emission.
//!
//! Every executed unsubscribe or delete action produces one
//! [`AuditEvent`] per affected sender. The core hands events to an
//! [`AuditSink`] and moves on: a sink failure is logged and swallowed,
//! never surfaced to the user-facing action.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ActionKind, ActionMethod, ActionResult, UserId};

/// Error from an audit sink implementation.
#[derive(Debug, Error)]
#[error("audit sink error: {0}")]
pub struct AuditError(pub String);

/// One audit record, emitted after an action completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// The user the action was performed for.
    pub user_id: UserId,
    /// What was done.
    pub action: ActionKind,
    /// Display name of the target sender.
    pub sender: String,
    /// Normalized address of the target sender.
    pub from_email: String,
    /// Mechanism used, when the action succeeded through one.
    pub method: Option<ActionMethod>,
    /// Messages affected (delete actions).
    pub count: u64,
    /// When the action completed.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Builds an event from an action result.
    pub fn from_result(user_id: &UserId, result: &ActionResult) -> Self {
        Self {
            user_id: user_id.clone(),
            action: result.action,
            sender: result.sender.clone(),
            from_email: result.from_email.clone(),
            method: result.method,
            count: result.affected_count,
            at: Utc::now(),
        }
    }
}

/// Trait for audit-log collaborators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one audit event.
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Audit sink that writes events to the tracing log.
///
/// Useful as a default when no persistent sink is wired up.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            user_id = %event.user_id,
            action = ?event.action,
            from_email = %event.from_email,
            method = ?event.method,
            count = event.count,
            "action recorded"
        );
        Ok(())
    }
}

/// Records an event, logging and swallowing any sink failure.
pub(crate) async fn record_or_warn(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.record(&event).await {
        tracing::warn!(error = %e, from_email = %event.from_email, "audit record failed");
    }
}
