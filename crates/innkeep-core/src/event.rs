//! # Activity Events
//!
//! Explicit event emission for the activity log. Each state-machine
//! operation appends its events inside the same transaction as the
//! mutation, replacing any implicit signal machinery with a plain list of
//! `(entity, kind, payload)` rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One activity-log entry, before persistence assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Entity class the event is about ("reservation", "folio", ...).
    pub entity_type: String,
    /// Identifier of the affected entity.
    pub entity_id: String,
    /// Event kind ("guest_checkin", "charge_posted", ...).
    pub kind: String,
    /// Structured context for the event.
    pub payload: Value,
    /// Actor id that performed the operation.
    pub actor: String,
}

impl ActivityEvent {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        kind: impl Into<String>,
        payload: Value,
        actor: impl Into<String>,
    ) -> Self {
        ActivityEvent {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            kind: kind.into(),
            payload,
            actor: actor.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_construction() {
        let event = ActivityEvent::new(
            "folio",
            "f-1",
            "charge_posted",
            json!({ "kind": "minibar", "amount_cents": 900 }),
            "user-1",
        );
        assert_eq!(event.kind, "charge_posted");
        assert_eq!(event.payload["amount_cents"], 900);
    }
}
