//! Integration tests for core services.
//!
//! These tests drive the public service APIs against scripted in-memory
//! collaborators. Each service module contains its own unit tests for
//! detailed logic; the scenarios here cross module boundaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sweep::config::{ScanSettings, UnsubscribeSettings};
use sweep::domain::{
    normalize_from_header, parse_list_unsubscribe, ActionMethod, DirectiveKind, UserId,
};
use sweep::providers::mail::{
    MailProvider, MessageHeader, MessageIdPage, MessageMetadata, ProviderError,
};
use sweep::services::{
    AuditError, AuditEvent, AuditSink, ScanService, TracingAuditSink, TrashService,
    TransportError, UnsubscribeSelection, UnsubscribeService, UnsubscribeTransport,
};

// ============================================================================
// Scripted collaborators
// ============================================================================

/// One message in the scripted mailbox.
#[derive(Clone)]
struct ScriptedMessage {
    id: String,
    from: Option<String>,
    list_unsubscribe: Option<String>,
}

/// In-memory mail provider scripting list pages per query.
#[derive(Default)]
struct ScriptedMailbox {
    /// Message ids returned per query, in pages of `page_size`.
    messages_by_query: HashMap<String, Vec<ScriptedMessage>>,
    page_size: usize,
    trashed: Mutex<Vec<Vec<String>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedMailbox {
    fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    fn with_messages(mut self, query: &str, messages: Vec<ScriptedMessage>) -> Self {
        self.messages_by_query.insert(query.to_string(), messages);
        self
    }

    fn all_messages(&self) -> impl Iterator<Item = &ScriptedMessage> {
        self.messages_by_query.values().flatten()
    }
}

#[async_trait]
impl MailProvider for ScriptedMailbox {
    async fn list_message_ids<'a>(
        &self,
        query: &str,
        page_token: Option<&'a str>,
    ) -> Result<MessageIdPage, ProviderError> {
        let messages = self
            .messages_by_query
            .get(query)
            .cloned()
            .unwrap_or_default();

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(messages.len());
        let next_page_token = (end < messages.len()).then(|| end.to_string());

        Ok(MessageIdPage {
            ids: messages[start..end].iter().map(|m| m.id.clone()).collect(),
            next_page_token,
        })
    }

    async fn get_message_metadata(
        &self,
        id: &str,
        header_names: &[&'static str],
    ) -> Result<MessageMetadata, ProviderError> {
        let message = self
            .all_messages()
            .find(|m| m.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        let mut headers = Vec::new();
        if header_names.contains(&"From") {
            if let Some(from) = &message.from {
                headers.push(MessageHeader {
                    name: "From".to_string(),
                    value: from.clone(),
                });
            }
        }
        if header_names.contains(&"List-Unsubscribe") {
            if let Some(lu) = &message.list_unsubscribe {
                headers.push(MessageHeader {
                    name: "List-Unsubscribe".to_string(),
                    value: lu.clone(),
                });
            }
        }

        Ok(MessageMetadata {
            id: id.to_string(),
            headers,
        })
    }

    async fn batch_add_label(&self, ids: &[String], _label: &str) -> Result<(), ProviderError> {
        self.trashed.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    async fn send_raw_message(&self, raw_base64url: &str) -> Result<String, ProviderError> {
        self.sent.lock().unwrap().push(raw_base64url.to_string());
        Ok(format!("sent-{}", self.sent.lock().unwrap().len()))
    }
}

/// Transport scripting HTTP outcomes per URL.
#[derive(Default)]
struct ScriptedTransport {
    get_success: Vec<String>,
    post_success: Vec<String>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl UnsubscribeTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<bool, TransportError> {
        self.calls.lock().unwrap().push(format!("GET {}", url));
        Ok(self.get_success.iter().any(|u| u == url))
    }

    async fn post(&self, url: &str) -> Result<bool, TransportError> {
        self.calls.lock().unwrap().push(format!("POST {}", url));
        Ok(self.post_success.iter().any(|u| u == url))
    }
}

/// Audit sink counting recorded events.
#[derive(Default)]
struct CountingSink {
    events: AtomicUsize,
}

#[async_trait]
impl AuditSink for CountingSink {
    async fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        self.events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn message(id: &str, from: &str, unsub: Option<&str>) -> ScriptedMessage {
    ScriptedMessage {
        id: id.to_string(),
        from: Some(from.to_string()),
        list_unsubscribe: unsub.map(String::from),
    }
}

const WINDOW: &str = "label:inbox newer_than:90d";

// ============================================================================
// Domain scenarios
// ============================================================================

#[test]
fn normalizer_splits_name_and_address() {
    let id = normalize_from_header("Promo <Deals@Shop.com>");
    assert_eq!(id.display_name, "Promo");
    assert_eq!(id.email_address, "deals@shop.com");
}

#[test]
fn directive_parse_preserves_order_and_kinds() {
    let directives = parse_list_unsubscribe("<https://a.com/x>, <mailto:b@c.com?subject=Bye>");

    assert_eq!(directives.len(), 2);
    assert_eq!(directives[0].value, "https://a.com/x");
    assert_eq!(directives[0].kind, DirectiveKind::Http);
    assert_eq!(directives[1].value, "mailto:b@c.com?subject=Bye");
    assert_eq!(directives[1].kind, DirectiveKind::Mailto);
}

// ============================================================================
// Scan scenarios
// ============================================================================

#[tokio::test]
async fn scan_aggregates_repeated_sender() {
    let unsub = "<https://shop.com/u>, <mailto:unsub@shop.com>";
    let mailbox = ScriptedMailbox::new(2).with_messages(
        WINDOW,
        vec![
            message("m1", "Promo <deals@shop.com>", Some(unsub)),
            message("m2", "Promo <deals@shop.com>", Some(unsub)),
            message("m3", "Promo <deals@shop.com>", Some(unsub)),
        ],
    );

    let scanner = ScanService::new(Arc::new(mailbox), ScanSettings::default());
    let senders = scanner.scan_senders().await.unwrap();

    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0].email_address, "deals@shop.com");
    assert_eq!(senders[0].message_count, 3);
    assert!(senders[0].has_http);
    assert!(senders[0].has_mailto);
    assert_eq!(senders[0].unsubscribe_directive.as_deref(), Some(unsub));
}

#[tokio::test]
async fn scan_orders_by_message_count_descending() {
    let mailbox = ScriptedMailbox::new(10).with_messages(
        WINDOW,
        vec![
            message("m1", "One <one@x.com>", None),
            message("m2", "Two <two@y.com>", None),
            message("m3", "Two <two@y.com>", None),
            message("m4", "Three <three@z.com>", None),
            message("m5", "Three <three@z.com>", None),
            message("m6", "Three <three@z.com>", None),
        ],
    );

    let scanner = ScanService::new(Arc::new(mailbox), ScanSettings::default());
    let senders = scanner.scan_senders().await.unwrap();

    let counts: Vec<u64> = senders.iter().map(|s| s.message_count).collect();
    assert_eq!(counts, vec![3, 2, 1]);
}

// ============================================================================
// Unsubscribe scenarios
// ============================================================================

fn unsubscribe_service(
    transport: ScriptedTransport,
    mailbox: Arc<ScriptedMailbox>,
    sink: Arc<CountingSink>,
) -> UnsubscribeService {
    UnsubscribeService::new(
        UserId::from("user-1"),
        Arc::new(transport),
        mailbox,
        sink,
        UnsubscribeSettings::default(),
    )
}

#[tokio::test]
async fn get_fails_post_succeeds_no_mailto_attempted() {
    let transport = ScriptedTransport {
        post_success: vec!["https://shop.com/u".to_string()],
        ..Default::default()
    };
    let mailbox = Arc::new(ScriptedMailbox::new(10));
    let sink = Arc::new(CountingSink::default());

    let service = unsubscribe_service(transport, mailbox.clone(), sink);
    let outcome = service
        .unsubscribe("<https://shop.com/u>, <mailto:unsub@shop.com>")
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.method, Some(ActionMethod::Http));
    assert!(mailbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn http_exhausted_mailto_send_succeeds() {
    let transport = ScriptedTransport::default();
    let mailbox = Arc::new(ScriptedMailbox::new(10));
    let sink = Arc::new(CountingSink::default());

    let service = unsubscribe_service(transport, mailbox.clone(), sink);
    let outcome = service
        .unsubscribe("<https://shop.com/u>, <mailto:unsub@shop.com>")
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.method, Some(ActionMethod::Mailto));
    assert_eq!(mailbox.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_directive_header_reports_failure() {
    let transport = ScriptedTransport::default();
    let mailbox = Arc::new(ScriptedMailbox::new(10));
    let sink = Arc::new(CountingSink::default());

    let service = unsubscribe_service(transport, mailbox.clone(), sink);
    let outcome = service.unsubscribe("").await;

    assert!(!outcome.success);
    assert_eq!(outcome.method, None);
    assert!(mailbox.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn multi_sender_run_audits_each_sender_in_order() {
    let transport = ScriptedTransport {
        get_success: vec!["https://a.com/u".to_string(), "https://b.com/u".to_string()],
        ..Default::default()
    };
    let mailbox = Arc::new(ScriptedMailbox::new(10));
    let sink = Arc::new(CountingSink::default());

    let service = unsubscribe_service(transport, mailbox, sink.clone());

    let selections = vec![
        UnsubscribeSelection {
            sender: "A".to_string(),
            from_email: "a@x.com".to_string(),
            directive_header: Some("<https://a.com/u>".to_string()),
        },
        UnsubscribeSelection {
            sender: "B".to_string(),
            from_email: "b@y.com".to_string(),
            directive_header: Some("<https://b.com/u>".to_string()),
        },
    ];

    let start = tokio::time::Instant::now();
    let results = service.unsubscribe_many(&selections).await;

    assert!(start.elapsed() >= Duration::from_millis(240));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].from_email, "a@x.com");
    assert_eq!(results[1].from_email, "b@y.com");
    assert!(results.iter().all(|r| r.success));
    assert_eq!(sink.events.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Trash scenarios
// ============================================================================

#[tokio::test]
async fn trash_reports_per_sender_counts() {
    let a_messages: Vec<ScriptedMessage> = (0..120)
        .map(|i| message(&format!("a{}", i), "A <a@x.com>", None))
        .collect();
    let b_messages: Vec<ScriptedMessage> = (0..4)
        .map(|i| message(&format!("b{}", i), "B <b@y.com>", None))
        .collect();

    let mailbox = Arc::new(
        ScriptedMailbox::new(500)
            .with_messages(&format!("{} from:a@x.com", WINDOW), a_messages)
            .with_messages(&format!("{} from:b@y.com", WINDOW), b_messages),
    );

    let service = TrashService::new(
        UserId::from("user-1"),
        mailbox.clone(),
        Arc::new(TracingAuditSink),
        ScanSettings::default(),
    );

    let senders = vec!["a@x.com".to_string(), "b@y.com".to_string()];
    let outcomes = service.trash_senders(&senders, None).await;

    assert_eq!(outcomes["a@x.com"].affected, 120);
    assert_eq!(outcomes["b@y.com"].affected, 4);
    assert!(outcomes.values().all(|o| o.error.is_none()));

    // 120 ids fit in a single mutation batch.
    let batches = mailbox.trashed.lock().unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.len() <= 1000));
}
