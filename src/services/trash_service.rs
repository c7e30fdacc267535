//! Bulk move-to-trash of messages by sender.
//!
//! For each selected sender the service re-queries the mailbox with the
//! sender restriction appended, then applies the trash label in batches
//! capped at the provider's batchModify ceiling. Senders are processed
//! independently: one sender's failure never blocks the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ScanSettings;
use crate::domain::{ActionKind, ActionResult, UserId};
use crate::providers::mail::{MailProvider, MAX_BATCH_MODIFY_IDS, TRASH_LABEL};
use crate::services::audit::{record_or_warn, AuditEvent, AuditSink};

/// Per-sender result of a bulk trash run.
///
/// `affected` counts messages whose mutation batch was accepted. A
/// failure lands in `error`, so a sender with no matching mail
/// (`{0, None}`) is distinguishable from one whose mutation failed
/// (`{0, Some(..)}` or a partial count with an error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashOutcome {
    /// Messages moved to trash for this sender.
    pub affected: u64,
    /// The failure that cut this sender short, if any.
    pub error: Option<String>,
}

impl TrashOutcome {
    fn clean(affected: u64) -> Self {
        Self {
            affected,
            error: None,
        }
    }
}

/// Service that bulk-trashes messages from selected senders.
pub struct TrashService {
    user_id: UserId,
    provider: Arc<dyn MailProvider>,
    sink: Arc<dyn AuditSink>,
    settings: ScanSettings,
}

impl TrashService {
    /// Creates a trash service over a mail provider.
    pub fn new(
        user_id: UserId,
        provider: Arc<dyn MailProvider>,
        sink: Arc<dyn AuditSink>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            user_id,
            provider,
            sink,
            settings,
        }
    }

    /// Trashes all matching messages for each sender address.
    ///
    /// `query` overrides the configured scan window; either way the
    /// sender restriction `from:<address>` is appended per sender. One
    /// audit event is emitted per sender with the affected count.
    pub async fn trash_senders(
        &self,
        senders: &[String],
        query: Option<&str>,
    ) -> BTreeMap<String, TrashOutcome> {
        let base_query = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => &self.settings.query,
        };

        let mut outcomes = BTreeMap::new();
        for sender in senders {
            let outcome = self.trash_one(base_query, sender).await;

            let result = ActionResult {
                sender: String::new(),
                from_email: sender.clone(),
                action: ActionKind::Delete,
                success: outcome.error.is_none(),
                method: None,
                affected_count: outcome.affected,
            };
            record_or_warn(
                self.sink.as_ref(),
                AuditEvent::from_result(&self.user_id, &result),
            )
            .await;

            outcomes.insert(sender.clone(), outcome);
        }

        outcomes
    }

    /// Trashes one sender's messages, reporting partial progress on
    /// failure instead of propagating.
    async fn trash_one(&self, base_query: &str, sender: &str) -> TrashOutcome {
        let query = format!("{} from:{}", base_query, sender);

        let ids = match self.list_all_ids(&query).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(sender, error = %e, "listing messages for trash failed");
                return TrashOutcome {
                    affected: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        if ids.is_empty() {
            tracing::debug!(sender, "no matching messages");
            return TrashOutcome::clean(0);
        }

        let batch_size = self.settings.trash_batch_size.clamp(1, MAX_BATCH_MODIFY_IDS);
        let mut affected: u64 = 0;

        for batch in ids.chunks(batch_size) {
            match self.provider.batch_add_label(batch, TRASH_LABEL).await {
                Ok(()) => affected += batch.len() as u64,
                Err(e) => {
                    tracing::warn!(
                        sender,
                        affected,
                        error = %e,
                        "trash batch failed, keeping partial count"
                    );
                    return TrashOutcome {
                        affected,
                        error: Some(e.to_string()),
                    };
                }
            }
        }

        tracing::info!(sender, affected, "messages trashed");
        TrashOutcome::clean(affected)
    }

    async fn list_all_ids(&self, query: &str) -> crate::providers::mail::Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .provider
                .list_message_ids(query, page_token.as_deref())
                .await?;

            ids.extend(page.ids);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids)
    }
}
