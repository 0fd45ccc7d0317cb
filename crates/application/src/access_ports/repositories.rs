use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatewarden_core::AppResult;
use gatewarden_domain::{Permission, PermissionName, Role, RoleAssignment, RoleId, User, UserId};

/// Repository port for the permission registry.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Inserts a permission; fails with `Duplicate` when the name exists.
    async fn insert_permission(&self, permission: Permission) -> AppResult<()>;

    /// Finds a permission by name.
    async fn find_permission(&self, name: &PermissionName) -> AppResult<Option<Permission>>;

    /// Lists all permissions ordered by name.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Returns the subset of `names` that is not registered.
    async fn find_missing_permissions(
        &self,
        names: &[PermissionName],
    ) -> AppResult<Vec<PermissionName>>;

    /// Flips the active flag; fails with `NotFound` for unknown names.
    async fn set_permission_active(
        &self,
        name: &PermissionName,
        is_active: bool,
    ) -> AppResult<()>;
}

/// Repository port for the role catalog.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Inserts a role with its grants; fails with `Duplicate` when the name
    /// exists.
    async fn insert_role(&self, role: Role) -> AppResult<()>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists all roles ordered by priority descending, then name ascending.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Atomically replaces a role's grant list; fails with `NotFound` for
    /// unknown roles.
    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> AppResult<()>;

    /// Flips the active flag; fails with `NotFound` for unknown roles.
    async fn set_role_active(&self, role_id: RoleId, is_active: bool) -> AppResult<()>;
}

/// Outcome of an assignment insert attempt.
///
/// The store resolves duplicate-active races through its partial unique
/// index, so callers learn atomically whether their row landed or an active
/// row already covered the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentInsert {
    /// The new ledger row was inserted and is now the active assignment.
    Inserted(RoleAssignment),
    /// An active row already existed for the pair; returned unchanged.
    AlreadyActive(RoleAssignment),
}

/// Repository port for the append-only assignment ledger.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Inserts an active ledger row unless the pair already has one.
    async fn insert_assignment(&self, assignment: RoleAssignment)
    -> AppResult<AssignmentInsert>;

    /// Stamps the pair's active row inactive; returns the revoked row, or
    /// `None` when no active row existed.
    async fn revoke_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        revoked_by: UserId,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists active roles reachable from a user's active assignments.
    async fn list_active_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>>;

    /// Lists all ledger rows for a user, newest first, revoked rows included.
    async fn list_assignments_for_user(&self, user_id: UserId)
    -> AppResult<Vec<RoleAssignment>>;
}

/// Repository port for principal records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; fails with `Duplicate` when the subject exists.
    async fn insert_user(&self, user: User) -> AppResult<()>;

    /// Finds a user by identifier.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by subject.
    async fn find_user_by_subject(&self, subject: &str) -> AppResult<Option<User>>;
}
