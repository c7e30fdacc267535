//! `List-Unsubscribe` header parsing and classification.
//!
//! A header value is a comma-separated list of angle-bracketed endpoints,
//! e.g. `<https://shop.com/u>, <mailto:unsub@shop.com?subject=Bye>`.
//! Parsing yields an ordered candidate list; classification as HTTP or
//! mailto is a separate pure predicate reused by both the scanner (for
//! capability flags) and the executor (for dispatch order).

use serde::{Deserialize, Serialize};
use url::Url;

/// One parsed candidate endpoint from an unsubscribe header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// The endpoint with enclosing angle brackets stripped.
    pub value: String,
    /// Classification of the endpoint scheme.
    pub kind: DirectiveKind,
}

/// Classification of an unsubscribe endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// `http://` or `https://` URL.
    Http,
    /// `mailto:` URI.
    Mailto,
    /// Anything else; carried through but never dispatched.
    Other,
}

impl Directive {
    /// Returns true if this is an HTTP(S) endpoint.
    pub fn is_http(&self) -> bool {
        self.kind == DirectiveKind::Http
    }

    /// Returns true if this is a mailto endpoint.
    pub fn is_mailto(&self) -> bool {
        self.kind == DirectiveKind::Mailto
    }
}

/// Returns true if the entry starts with `http://` or `https://`,
/// case-insensitively.
pub fn is_http_entry(entry: &str) -> bool {
    let lower = entry.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns true if the entry starts with `mailto:`, case-insensitively.
pub fn is_mailto_entry(entry: &str) -> bool {
    entry.to_ascii_lowercase().starts_with("mailto:")
}

fn classify(entry: &str) -> DirectiveKind {
    if is_http_entry(entry) {
        DirectiveKind::Http
    } else if is_mailto_entry(entry) {
        DirectiveKind::Mailto
    } else {
        DirectiveKind::Other
    }
}

/// Parses a raw `List-Unsubscribe` header value into an ordered list of
/// candidate directives.
///
/// Splits on commas, trims whitespace, strips one leading `<` and one
/// trailing `>` from each piece, and drops empty results. Header order is
/// preserved. Parsing is idempotent: the same header always yields the
/// same list.
pub fn parse_list_unsubscribe(header: &str) -> Vec<Directive> {
    header
        .split(',')
        .map(|piece| {
            let piece = piece.trim();
            let piece = piece.strip_prefix('<').unwrap_or(piece);
            let piece = piece.strip_suffix('>').unwrap_or(piece);
            piece
        })
        .filter(|piece| !piece.is_empty())
        .map(|piece| Directive {
            value: piece.to_string(),
            kind: classify(piece),
        })
        .collect()
}

/// A decoded mailto unsubscribe target.
///
/// Carries the destination address and the subject/body to send, with the
/// conventional defaults filled in when the URI does not specify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailtoDirective {
    /// Destination address from the URI path.
    pub to: String,
    /// Subject line; defaults to `"Unsubscribe"`.
    pub subject: String,
    /// Plain-text body; defaults to `"Please unsubscribe me."`.
    pub body: String,
}

impl MailtoDirective {
    /// Default subject when the URI carries none.
    pub const DEFAULT_SUBJECT: &'static str = "Unsubscribe";
    /// Default body when the URI carries none.
    pub const DEFAULT_BODY: &'static str = "Please unsubscribe me.";

    /// Decodes a `mailto:` URI into its target address and the
    /// subject/body query parameters.
    ///
    /// Returns `None` for non-mailto or unparseable input, or when the
    /// URI has no target address.
    pub fn parse(entry: &str) -> Option<Self> {
        if !is_mailto_entry(entry) {
            return None;
        }
        let url = Url::parse(entry).ok()?;
        let to = url.path().to_string();
        if to.is_empty() {
            return None;
        }

        let mut subject = None;
        let mut body = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "subject" => subject = Some(value.into_owned()),
                "body" => body = Some(value.into_owned()),
                _ => {}
            }
        }

        Some(Self {
            to,
            subject: subject.unwrap_or_else(|| Self::DEFAULT_SUBJECT.to_string()),
            body: body.unwrap_or_else(|| Self::DEFAULT_BODY.to_string()),
        })
    }
}
