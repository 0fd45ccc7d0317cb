use std::str::FromStr;

use gatewarden_core::AppError;
use gatewarden_domain::{RoleId, UserId};

/// Input payload for registering a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Unique `resource:action` name.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// Grouping category for administrative listings.
    pub category: String,
    /// Resource segment; must agree with the name.
    pub resource: String,
    /// Action segment; must agree with the name.
    pub action: String,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Input payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Permission names granted by the role.
    pub permissions: Vec<String>,
    /// Listing priority; higher sorts first.
    pub priority: i32,
}

/// Input payload for a single role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Principal receiving the role.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Free-text justification recorded on the ledger row.
    pub reason: Option<String>,
}

/// Input payload for registering a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserInput {
    /// Unique login-name-like handle.
    pub subject: String,
    /// Human-readable label.
    pub display_name: String,
}

/// Operation applied to every pair of a batch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    /// Assign each role to each user.
    Assign,
    /// Revoke each role from each user.
    Revoke,
}

impl BatchAction {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Revoke => "revoke",
        }
    }
}

impl FromStr for BatchAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "assign" => Ok(Self::Assign),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!(
                "batch action must be 'assign' or 'revoke', got '{value}'"
            ))),
        }
    }
}

/// Input payload for a batch assign/revoke request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRoleInput {
    /// Principals affected by the batch.
    pub user_ids: Vec<UserId>,
    /// Roles affected by the batch.
    pub role_ids: Vec<RoleId>,
    /// Operation applied to every `(user, role)` pair.
    pub action: BatchAction,
    /// Justification copied to each created ledger row.
    pub reason: Option<String>,
}

/// One successfully processed batch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPair {
    /// Principal of the pair.
    pub user_id: UserId,
    /// Role of the pair.
    pub role_id: RoleId,
}

/// One failed batch pair with its stringified cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Principal of the pair.
    pub user_id: UserId,
    /// Role of the pair.
    pub role_id: RoleId,
    /// Stringified per-pair error.
    pub error: String,
}

/// Aggregated batch result; every requested pair appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRoleOutcome {
    /// Pairs whose operation completed.
    pub succeeded: Vec<BatchPair>,
    /// Pairs whose operation failed, in input order.
    pub failed: Vec<BatchFailure>,
}

impl BatchRoleOutcome {
    /// Returns the total number of processed pairs.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
