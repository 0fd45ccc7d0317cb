//! Role entity: a named, prioritized bundle of permission grants.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use gatewarden_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::PermissionName;
use crate::user::UserId;

/// Lowest accepted role priority.
pub const ROLE_PRIORITY_MIN: i32 = 0;

/// Highest accepted role priority.
pub const ROLE_PRIORITY_MAX: i32 = 10_000;

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validates a role priority against the accepted range.
///
/// Priority orders a principal's roles in listings; it never influences
/// permission merging, which stays additive.
pub fn validate_role_priority(priority: i32) -> AppResult<()> {
    if !(ROLE_PRIORITY_MIN..=ROLE_PRIORITY_MAX).contains(&priority) {
        return Err(AppError::Validation(format!(
            "role priority {priority} is out of range [{ROLE_PRIORITY_MIN}, {ROLE_PRIORITY_MAX}]"
        )));
    }

    Ok(())
}

/// Named, prioritized bundle of permission grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Globally unique role name.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Ordered, duplicate-free permission grants.
    pub permissions: Vec<PermissionName>,
    /// Listing priority; higher sorts first.
    pub priority: i32,
    /// Principal that created the role.
    pub created_by: UserId,
    /// Deactivation flag; roles are never hard-deleted.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates a role, validating the priority range and deduplicating the
    /// grant list while preserving first-occurrence order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
        permissions: Vec<PermissionName>,
        priority: i32,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        validate_role_priority(priority)?;

        Ok(Self {
            id,
            name: name.into(),
            display_name: display_name.into(),
            description,
            permissions: dedupe_grants(permissions),
            priority,
            created_by,
            is_active: true,
            created_at,
        })
    }

    /// Returns whether this role grants the requested permission.
    ///
    /// Inactive roles grant nothing.
    #[must_use]
    pub fn grants_permission(&self, requested: &PermissionName) -> bool {
        self.is_active && self.permissions.iter().any(|grant| grant.grants(requested))
    }
}

fn dedupe_grants(permissions: Vec<PermissionName>) -> Vec<PermissionName> {
    let mut seen = std::collections::HashSet::new();
    permissions
        .into_iter()
        .filter(|grant| seen.insert(grant.clone()))
        .collect()
}
