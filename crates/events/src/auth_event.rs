use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kasir_core::UserId;

use crate::event::Event;

/// Authentication state change reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    SignedOut {
        occurred_at: DateTime<Utc>,
    },
}

impl AuthEvent {
    pub fn signed_in(user_id: UserId) -> Self {
        Self::SignedIn {
            user_id,
            occurred_at: Utc::now(),
        }
    }

    pub fn signed_out() -> Self {
        Self::SignedOut {
            occurred_at: Utc::now(),
        }
    }
}

impl Event for AuthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn { .. } => "auth.signed_in",
            AuthEvent::SignedOut { .. } => "auth.signed_out",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AuthEvent::SignedIn { occurred_at, .. } | AuthEvent::SignedOut { occurred_at } => {
                *occurred_at
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_stable() {
        assert_eq!(AuthEvent::signed_in(UserId::new()).event_type(), "auth.signed_in");
        assert_eq!(AuthEvent::signed_out().event_type(), "auth.signed_out");
    }

    #[test]
    fn serializes_with_wire_tag() {
        let json = serde_json::to_value(AuthEvent::signed_out()).unwrap();
        assert_eq!(json["event"], "SIGNED_OUT");
    }
}
