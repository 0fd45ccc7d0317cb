//! Stable audit actions emitted by application use-cases.

use std::str::FromStr;

use gatewarden_core::AppError;
use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission is registered.
    PermissionCreated,
    /// Emitted when a permission is deactivated.
    PermissionDeactivated,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role's grant list is replaced.
    RolePermissionsUpdated,
    /// Emitted when a role is deactivated.
    RoleDeactivated,
    /// Emitted when a role is assigned to a principal.
    RoleAssigned,
    /// Emitted when a role assignment is revoked.
    RoleRevoked,
    /// Emitted when a principal is registered.
    UserRegistered,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionCreated => "permission.created",
            Self::PermissionDeactivated => "permission.deactivated",
            Self::RoleCreated => "role.created",
            Self::RolePermissionsUpdated => "role.permissions_updated",
            Self::RoleDeactivated => "role.deactivated",
            Self::RoleAssigned => "role.assigned",
            Self::RoleRevoked => "role.revoked",
            Self::UserRegistered => "user.registered",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "permission.created" => Ok(Self::PermissionCreated),
            "permission.deactivated" => Ok(Self::PermissionDeactivated),
            "role.created" => Ok(Self::RoleCreated),
            "role.permissions_updated" => Ok(Self::RolePermissionsUpdated),
            "role.deactivated" => Ok(Self::RoleDeactivated),
            "role.assigned" => Ok(Self::RoleAssigned),
            "role.revoked" => Ok(Self::RoleRevoked),
            "user.registered" => Ok(Self::UserRegistered),
            _ => Err(AppError::Validation(format!(
                "unknown audit action value '{value}'"
            ))),
        }
    }
}
