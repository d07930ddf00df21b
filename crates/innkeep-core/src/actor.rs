//! # Actors and Scopes
//!
//! Every state-machine operation takes an explicit `actor` parameter; the
//! actor is recorded on the rows it creates and checked against the scope
//! the operation requires. User storage and session handling are external
//! collaborators; this module only carries what the core needs to enforce
//! and record.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

/// Operator roles, in decreasing breadth of access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Staff,
    Housekeeping,
    Maintenance,
    Accountant,
}

/// Operation scopes gating the state-changing entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Reservations, check-in/out, folios, POS.
    FrontDesk,
    /// Room status changes outside the check-in machine.
    Housekeeping,
    /// Stock movements, stock takes, purchase orders.
    Inventory,
    /// The nightly close.
    NightAudit,
}

impl Scope {
    fn name(self) -> &'static str {
        match self {
            Scope::FrontDesk => "front_desk",
            Scope::Housekeeping => "housekeeping",
            Scope::Inventory => "inventory",
            Scope::NightAudit => "night_audit",
        }
    }
}

impl Role {
    /// Whether this role may act within the given scope.
    pub fn permits(self, scope: Scope) -> bool {
        match (self, scope) {
            (Role::Owner, _) => true,
            (Role::Staff, Scope::FrontDesk | Scope::Housekeeping | Scope::Inventory) => true,
            (Role::Housekeeping, Scope::Housekeeping) => true,
            (Role::Maintenance, Scope::Housekeeping) => true,
            (Role::Accountant, Scope::NightAudit) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The identity performing an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier, recorded on every row the operation writes.
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor { id: id.into(), role }
    }

    /// Fails with `AuthorizationDenied` when the actor's role does not
    /// cover the scope.
    pub fn require(&self, scope: Scope) -> CoreResult<()> {
        if self.role.permits(scope) {
            Ok(())
        } else {
            Err(CoreError::AuthorizationDenied {
                actor: self.id.clone(),
                operation: scope.name().to_string(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_permits_everything() {
        for scope in [
            Scope::FrontDesk,
            Scope::Housekeeping,
            Scope::Inventory,
            Scope::NightAudit,
        ] {
            assert!(Role::Owner.permits(scope));
        }
    }

    #[test]
    fn test_housekeeping_cannot_run_audit() {
        let actor = Actor::new("hk-1", Role::Housekeeping);
        assert!(actor.require(Scope::Housekeeping).is_ok());
        assert!(matches!(
            actor.require(Scope::NightAudit),
            Err(CoreError::AuthorizationDenied { .. })
        ));
    }

    #[test]
    fn test_accountant_runs_audit_only() {
        let actor = Actor::new("acc-1", Role::Accountant);
        assert!(actor.require(Scope::NightAudit).is_ok());
        assert!(actor.require(Scope::FrontDesk).is_err());
    }
}
