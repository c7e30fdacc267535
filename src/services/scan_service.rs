//! Mailbox scanning and per-sender aggregation.
//!
//! The [`ScanService`] enumerates every message in the scan window,
//! fetches only the `From` and `List-Unsubscribe` headers, and folds the
//! results into one [`SenderAggregate`] per normalized sender address.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ScanSettings;
use crate::domain::{normalize_from_header, SenderAggregate};
use crate::providers::mail::{MailProvider, Result};

/// The only headers a scan needs; everything else stays on the server.
const METADATA_HEADERS: [&str; 2] = ["From", "List-Unsubscribe"];

/// Service that produces the sender list for a mailbox.
pub struct ScanService {
    provider: Arc<dyn MailProvider>,
    settings: ScanSettings,
}

impl ScanService {
    /// Creates a scan service over a mail provider.
    pub fn new(provider: Arc<dyn MailProvider>, settings: ScanSettings) -> Self {
        Self { provider, settings }
    }

    /// Scans the default window (`label:inbox newer_than:90d` unless the
    /// settings override it) and returns aggregates sorted by message
    /// count, descending.
    pub async fn scan_senders(&self) -> Result<Vec<SenderAggregate>> {
        let query = self.settings.query.clone();
        self.scan_senders_with_query(&query).await
    }

    /// Scans with an explicit search predicate.
    ///
    /// # Errors
    ///
    /// A failure listing any page aborts the scan: a partial id list
    /// would silently undercount senders. Individual metadata fetch
    /// failures only drop that message from the aggregation.
    pub async fn scan_senders_with_query(&self, query: &str) -> Result<Vec<SenderAggregate>> {
        let ids = self.list_all_ids(query).await?;
        tracing::info!(count = ids.len(), query, "scan window enumerated");

        // Keyed by normalized address. A BTreeMap plus a stable sort
        // below makes the output order reproducible across runs.
        let mut aggregates: BTreeMap<String, SenderAggregate> = BTreeMap::new();

        for batch in ids.chunks(self.settings.metadata_batch_size.max(1)) {
            // All fetches in one batch run concurrently; the batch
            // boundary is a synchronization point. join_all preserves
            // input order, so the fold below follows listing order and
            // the first-seen directive is deterministic.
            let fetches = batch
                .iter()
                .map(|id| self.provider.get_message_metadata(id, &METADATA_HEADERS));
            let results = futures::future::join_all(fetches).await;

            for (id, result) in batch.iter().zip(results) {
                let metadata = match result {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        tracing::warn!(message_id = %id, error = %e, "metadata fetch failed, skipping");
                        continue;
                    }
                };

                // A message without a usable From header cannot be
                // grouped; an empty value counts as missing.
                let Some(from) = metadata.header("From").filter(|v| !v.trim().is_empty()) else {
                    tracing::debug!(message_id = %id, "no From header, skipping");
                    continue;
                };

                let identity = normalize_from_header(from);
                let unsubscribe = metadata.header("List-Unsubscribe");
                aggregates
                    .entry(identity.email_address.clone())
                    .or_insert_with(|| SenderAggregate::first(identity))
                    .fold_message(unsubscribe);
            }
        }

        let mut senders: Vec<SenderAggregate> = aggregates.into_values().collect();
        senders.sort_by(|a, b| b.message_count.cmp(&a.message_count));

        tracing::info!(senders = senders.len(), "scan complete");
        Ok(senders)
    }

    /// Pages through the search endpoint until the continuation token is
    /// exhausted, collecting message ids only.
    async fn list_all_ids(&self, query: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            // Pagination failures are fatal to the scan.
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
