//! Domain types and pure functions.
//!
//! Everything in this module is a plain value or a deterministic
//! function: sender identity normalization, unsubscribe directive
//! parsing, and the result types handed to collaborators. No I/O.

mod action;
mod directive;
mod sender;
mod types;

pub use action::{ActionKind, ActionMethod, ActionResult};
pub use directive::{
    is_http_entry, is_mailto_entry, parse_list_unsubscribe, Directive, DirectiveKind,
    MailtoDirective,
};
pub use sender::{normalize_from_header, SenderAggregate, SenderIdentity};
pub use types::UserId;
