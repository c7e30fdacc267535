//! Outcomes of executed mailbox actions.
//!
//! An [`ActionResult`] is created once when an action completes and is
//! never updated; it is the unit handed to the audit-log collaborator.

use serde::{Deserialize, Serialize};

/// The kind of action that was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// An unsubscribe attempt against a sender's directive set.
    Unsubscribe,
    /// A bulk move-to-trash of a sender's messages.
    Delete,
}

/// The mechanism through which an unsubscribe succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMethod {
    /// An HTTP GET or POST to an unsubscribe URL was accepted.
    Http,
    /// An unsubscribe email was sent to a mailto target.
    Mailto,
}

/// Immutable outcome of one executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Display name of the target sender, if known.
    pub sender: String,
    /// Normalized address of the target sender.
    pub from_email: String,
    /// What was attempted.
    pub action: ActionKind,
    /// Whether the action took effect.
    pub success: bool,
    /// Mechanism used, when one succeeded. `None` for failures and for
    /// delete actions.
    pub method: Option<ActionMethod>,
    /// Messages affected; meaningful for delete actions.
    pub affected_count: u64,
}
