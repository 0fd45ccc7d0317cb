//! Permission names, wildcard grant matching, and the permission entity.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gatewarden_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Segment literal that matches any concrete value in its position.
pub const WILDCARD_SEGMENT: &str = "*";

/// Unique identifier for a permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated permission name of the form `resource:action`.
///
/// Either segment may be the full wildcard `*`; partial wildcards such as
/// `adm*` are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must not contain whitespace"
            )));
        }

        let Some((resource, action)) = value.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission name '{value}' must use the 'resource:action' form"
            )));
        };

        validate_segment(resource, "resource", value.as_str())?;
        validate_segment(action, "action", value.as_str())?;

        Ok(Self(value))
    }

    /// Returns the full `resource:action` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the resource segment.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.0.split_once(':').map_or("", |(resource, _)| resource)
    }

    /// Returns the action segment.
    #[must_use]
    pub fn action(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, action)| action)
    }

    /// Classifies how this name behaves when used as a grant.
    #[must_use]
    pub fn grant_match(&self) -> GrantMatch {
        match (
            self.resource() == WILDCARD_SEGMENT,
            self.action() == WILDCARD_SEGMENT,
        ) {
            (true, true) => GrantMatch::FullWildcard,
            (false, true) => GrantMatch::ActionWildcard,
            _ => GrantMatch::Exact,
        }
    }

    /// Returns whether this grant covers the requested permission.
    ///
    /// Matching is case-sensitive and limited to the closed set of grant
    /// kinds: exact name, `resource:*`, and `*:*`. A wildcard resource with a
    /// concrete action only matches its own literal name.
    #[must_use]
    pub fn grants(&self, requested: &PermissionName) -> bool {
        match self.grant_match() {
            GrantMatch::FullWildcard => true,
            GrantMatch::ActionWildcard => self.resource() == requested.resource(),
            GrantMatch::Exact => self.0 == requested.0,
        }
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

fn validate_segment(segment: &str, position: &str, name: &str) -> AppResult<()> {
    if segment.is_empty() {
        return Err(AppError::Validation(format!(
            "permission name '{name}' has an empty {position} segment"
        )));
    }

    if segment.contains(':') {
        return Err(AppError::Validation(format!(
            "permission name '{name}' must contain exactly one ':'"
        )));
    }

    if segment.contains('*') && segment != WILDCARD_SEGMENT {
        return Err(AppError::Validation(format!(
            "permission name '{name}' uses a partial wildcard in its {position} segment"
        )));
    }

    Ok(())
}

/// Closed enumeration of grant match kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantMatch {
    /// Grant matches only its own literal name.
    Exact,
    /// Grant of the form `resource:*`, matching any action on the resource.
    ActionWildcard,
    /// Grant `*:*`, matching every permission.
    FullWildcard,
}

/// Atomic capability registered in the permission registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Globally unique `resource:action` name, immutable after creation.
    pub name: PermissionName,
    /// Human-readable label.
    pub display_name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Grouping category for administrative listings.
    pub category: String,
    /// Resource segment, always equal to the name's first segment.
    pub resource: String,
    /// Action segment, always equal to the name's second segment.
    pub action: String,
    /// Deactivation flag; permissions are never hard-deleted.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission, checking that `resource` and `action` agree with
    /// the name's segments.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PermissionId,
        name: PermissionName,
        display_name: impl Into<String>,
        category: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let resource = resource.into();
        let action = action.into();

        if name.resource() != resource || name.action() != action {
            return Err(AppError::Validation(format!(
                "permission name '{name}' does not match resource '{resource}' and action '{action}'"
            )));
        }

        Ok(Self {
            id,
            name,
            display_name: display_name.into(),
            description,
            category: category.into(),
            resource,
            action,
            is_active: true,
            created_at,
        })
    }
}
