//! Sender identity normalization and per-sender aggregation.
//!
//! The normalized lowercase email address is the sole grouping key for a
//! scan: two `From` headers differing only in display name or address
//! casing collapse into one [`SenderAggregate`].

use serde::{Deserialize, Serialize};

/// A sender identity parsed from a `From` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    /// Best-effort human-readable name. May be empty.
    pub display_name: String,
    /// Canonical lowercase address; the aggregation key.
    pub email_address: String,
}

/// Parses a raw `From` header into a [`SenderIdentity`].
///
/// Headers of the form `Name <addr>` split into the trimmed name and the
/// lowercased, trimmed address. Anything else (a bare address, or a
/// malformed header) degrades to a best-effort echo: the trimmed input
/// is used as both fields, with the address lowercased.
///
/// Pure and deterministic; never fails.
pub fn normalize_from_header(raw: &str) -> SenderIdentity {
    let raw = raw.trim();
    if let Some(start) = raw.find('<') {
        if let Some(end) = raw.rfind('>') {
            if start < end {
                let name = raw[..start].trim().trim_matches('"');
                let address = raw[start + 1..end].trim().to_lowercase();
                return SenderIdentity {
                    display_name: name.to_string(),
                    email_address: address,
                };
            }
        }
    }
    SenderIdentity {
        display_name: raw.to_string(),
        email_address: raw.to_lowercase(),
    }
}

/// Per-sender rollup produced by a mailbox scan.
///
/// One entry per distinct normalized sender address observed in the scan
/// window. Counts and capability flags accumulate monotonically during a
/// single scan pass; the raw unsubscribe header is kept from the first
/// message in listing order that carried one and is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderAggregate {
    /// Display name from the first message seen for this sender.
    pub display_name: String,
    /// Canonical lowercase address; unique per scan result.
    pub email_address: String,
    /// Number of messages attributed to this sender in the window.
    pub message_count: u64,
    /// Raw `List-Unsubscribe` header value, if any message carried one.
    pub unsubscribe_directive: Option<String>,
    /// Whether any message in the group carried an HTTP unsubscribe URL.
    pub has_http: bool,
    /// Whether any message in the group carried a mailto unsubscribe URI.
    pub has_mailto: bool,
}

impl SenderAggregate {
    /// Creates an aggregate for the first message seen from a sender.
    pub fn first(identity: SenderIdentity) -> Self {
        Self {
            display_name: identity.display_name,
            email_address: identity.email_address,
            message_count: 0,
            unsubscribe_directive: None,
            has_http: false,
            has_mailto: false,
        }
    }

    /// Folds one message's unsubscribe header into the aggregate.
    ///
    /// Count always increments; capability flags OR in; the raw header is
    /// supplemented only if none was kept yet. The fold is commutative in
    /// count and flags, so batch-completion order cannot change them.
    pub fn fold_message(&mut self, unsubscribe_header: Option<&str>) {
        self.message_count += 1;
        if let Some(header) = unsubscribe_header {
            let directives = crate::domain::parse_list_unsubscribe(header);
            self.has_http |= directives.iter().any(|d| d.is_http());
            self.has_mailto |= directives.iter().any(|d| d.is_mailto());
            if self.unsubscribe_directive.is_none() {
                self.unsubscribe_directive = Some(header.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_name_and_address() {
        let id = normalize_from_header("Jane Doe <jane@example.com>");
        assert_eq!(id.display_name, "Jane Doe");
        assert_eq!(id.email_address, "jane@example.com");
    }

    #[test]
    fn normalize_lowercases_and_trims_address() {
        let id = normalize_from_header("  Promo Team  < Deals@Shop.COM > ");
        assert_eq!(id.display_name, "Promo Team");
        assert_eq!(id.email_address, "deals@shop.com");
    }

    #[test]
    fn normalize_strips_quoted_name() {
        let id = normalize_from_header("\"Doe, Jane\" <jane@example.com>");
        assert_eq!(id.display_name, "Doe, Jane");
        assert_eq!(id.email_address, "jane@example.com");
    }

    #[test]
    fn normalize_bare_address_echoes_both_fields() {
        let id = normalize_from_header("  Jane@Example.com ");
        assert_eq!(id.display_name, "Jane@Example.com");
        assert_eq!(id.email_address, "jane@example.com");
    }

    #[test]
    fn normalize_malformed_input_never_fails() {
        let id = normalize_from_header("no brackets here");
        assert_eq!(id.display_name, "no brackets here");
        assert_eq!(id.email_address, "no brackets here");

        let id = normalize_from_header("broken <unclosed");
        assert_eq!(id.email_address, "broken <unclosed");
    }

    #[test]
    fn normalize_is_deterministic() {
        let a = normalize_from_header("Jane <JANE@x.com>");
        let b = normalize_from_header("Jane <JANE@x.com>");
        assert_eq!(a, b);
    }

    #[test]
    fn casing_variants_share_one_key() {
        let a = normalize_from_header("Jane <jane@example.com>");
        let b = normalize_from_header("J. Doe <JANE@EXAMPLE.COM>");
        assert_eq!(a.email_address, b.email_address);
    }

    #[test]
    fn fold_accumulates_count_and_flags() {
        let mut agg = SenderAggregate::first(normalize_from_header("Promo <deals@shop.com>"));
        agg.fold_message(Some("<https://shop.com/u>, <mailto:unsub@shop.com>"));
        agg.fold_message(None);
        agg.fold_message(Some("<https://shop.com/u>, <mailto:unsub@shop.com>"));

        assert_eq!(agg.message_count, 3);
        assert!(agg.has_http);
        assert!(agg.has_mailto);
        assert_eq!(
            agg.unsubscribe_directive.as_deref(),
            Some("<https://shop.com/u>, <mailto:unsub@shop.com>")
        );
    }

    #[test]
    fn fold_keeps_first_directive() {
        let mut agg = SenderAggregate::first(normalize_from_header("a <a@x.com>"));
        agg.fold_message(Some("<https://first.example/u>"));
        agg.fold_message(Some("<https://second.example/u>"));
        assert_eq!(
            agg.unsubscribe_directive.as_deref(),
            Some("<https://first.example/u>")
        );
    }

    #[test]
    fn fold_is_order_independent_for_count_and_flags() {
        let headers = [
            Some("<https://shop.com/u>"),
            None,
            Some("<mailto:unsub@shop.com>"),
            None,
        ];

        let mut forward = SenderAggregate::first(normalize_from_header("a <a@x.com>"));
        for header in headers.iter() {
            forward.fold_message(*header);
        }

        let mut reversed = SenderAggregate::first(normalize_from_header("a <a@x.com>"));
        for header in headers.iter().rev() {
            reversed.fold_message(*header);
        }

        // Count and capability flags are commutative across fold order.
        // The kept raw directive is the first seen, so it tracks fold
        // order by design; everything else must match.
        assert_eq!(forward.message_count, reversed.message_count);
        assert_eq!(forward.has_http, reversed.has_http);
        assert_eq!(forward.has_mailto, reversed.has_mailto);
        assert_eq!(forward.email_address, reversed.email_address);
        assert_eq!(forward.unsubscribe_directive.as_deref(), Some("<https://shop.com/u>"));
        assert_eq!(reversed.unsubscribe_directive.as_deref(), Some("<mailto:unsub@shop.com>"));
    }

    #[test]
    fn fold_supplements_directive_when_missing() {
        let mut agg = SenderAggregate::first(normalize_from_header("a <a@x.com>"));
        agg.fold_message(None);
        agg.fold_message(Some("<mailto:u@x.com>"));
        assert_eq!(agg.unsubscribe_directive.as_deref(), Some("<mailto:u@x.com>"));
        assert!(agg.has_mailto);
        assert!(!agg.has_http);
    }
}
