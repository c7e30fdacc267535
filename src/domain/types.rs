//! Core identifier types for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for the user whose mailbox is being operated on.
///
/// Opaque to the core; issued by the identity collaborator and used only
/// to look up credentials and to tag audit events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_equality() {
        let id1 = UserId::from("user-123");
        let id2 = UserId::from("user-123");
        let id3 = UserId::from("user-456");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn user_id_display() {
        let id = UserId::from("user-123");
        assert_eq!(id.to_string(), "user-123");
    }
}
