//! Assignment ledger rows linking principals to roles.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::RoleId;
use crate::user::UserId;

/// Unique identifier for a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a new random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Audit-tracked link between a principal and a role.
///
/// The ledger is append-only: revocation stamps the row inactive instead of
/// deleting it, and re-assignment after revocation inserts a new row. At most
/// one active row exists per `(user_id, role_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable ledger row identifier.
    pub id: AssignmentId,
    /// Principal holding the role.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Free-text justification captured at assignment time.
    pub reason: Option<String>,
    /// Principal that performed the assignment.
    pub assigned_by: UserId,
    /// Whether this row is the current active assignment for the pair.
    pub is_active: bool,
    /// Assignment timestamp.
    pub created_at: DateTime<Utc>,
    /// Revocation timestamp, set when the row is stamped inactive.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Principal that performed the revocation.
    pub revoked_by: Option<UserId>,
}

impl RoleAssignment {
    /// Creates a new active ledger row.
    #[must_use]
    pub fn new(
        user_id: UserId,
        role_id: RoleId,
        reason: Option<String>,
        assigned_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            user_id,
            role_id,
            reason,
            assigned_by,
            is_active: true,
            created_at,
            revoked_at: None,
            revoked_by: None,
        }
    }

    /// Stamps the row inactive with revocation metadata.
    pub fn revoke(&mut self, revoked_by: UserId, revoked_at: DateTime<Utc>) {
        self.is_active = false;
        self.revoked_at = Some(revoked_at);
        self.revoked_by = Some(revoked_by);
    }
}
