use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use gatewarden_application::{
    AssignmentInsert, AssignmentRepository, AuditEvent, AuditRepository, PermissionRepository,
    RoleRepository, UserRepository,
};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    Permission, PermissionName, Role, RoleAssignment, RoleId, User, UserId,
};

/// In-memory implementation of every access-control port.
///
/// Backs tests and local development; the uniqueness rules mirror the
/// Postgres constraints, including the one-active-row-per-pair ledger rule.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    permissions: RwLock<HashMap<String, Permission>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    assignments: RwLock<Vec<RoleAssignment>>,
    users: RwLock<HashMap<UserId, User>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded audit events.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryAccessRepository {
    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let key = permission.name.as_str().to_owned();
        let mut permissions = self.permissions.write().await;

        if permissions.contains_key(&key) {
            return Err(AppError::Duplicate(format!(
                "permission '{key}' already exists"
            )));
        }

        permissions.insert(key, permission);
        Ok(())
    }

    async fn find_permission(&self, name: &PermissionName) -> AppResult<Option<Permission>> {
        Ok(self.permissions.read().await.get(name.as_str()).cloned())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.read().await;
        let mut listed: Vec<Permission> = permissions.values().cloned().collect();
        listed.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(listed)
    }

    async fn find_missing_permissions(
        &self,
        names: &[PermissionName],
    ) -> AppResult<Vec<PermissionName>> {
        let permissions = self.permissions.read().await;
        Ok(names
            .iter()
            .filter(|name| !permissions.contains_key(name.as_str()))
            .cloned()
            .collect())
    }

    async fn set_permission_active(
        &self,
        name: &PermissionName,
        is_active: bool,
    ) -> AppResult<()> {
        let mut permissions = self.permissions.write().await;
        let Some(stored) = permissions.get_mut(name.as_str()) else {
            return Err(AppError::NotFound(format!(
                "permission '{name}' was not found"
            )));
        };

        stored.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        let mut roles = self.roles.write().await;

        if roles.values().any(|stored| stored.name == role.name) {
            return Err(AppError::Duplicate(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        roles.insert(role.id, role);
        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let mut listed: Vec<Role> = roles.values().cloned().collect();
        listed.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(listed)
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let Some(stored) = roles.get_mut(&role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        stored.permissions = permissions.to_vec();
        Ok(())
    }

    async fn set_role_active(&self, role_id: RoleId, is_active: bool) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let Some(stored) = roles.get_mut(&role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        stored.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAccessRepository {
    async fn insert_assignment(
        &self,
        assignment: RoleAssignment,
    ) -> AppResult<AssignmentInsert> {
        let mut assignments = self.assignments.write().await;

        if let Some(existing) = assignments.iter().find(|stored| {
            stored.is_active
                && stored.user_id == assignment.user_id
                && stored.role_id == assignment.role_id
        }) {
            return Ok(AssignmentInsert::AlreadyActive(existing.clone()));
        }

        assignments.push(assignment.clone());
        Ok(AssignmentInsert::Inserted(assignment))
    }

    async fn revoke_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        revoked_by: UserId,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<RoleAssignment>> {
        let mut assignments = self.assignments.write().await;

        let Some(stored) = assignments.iter_mut().find(|stored| {
            stored.is_active && stored.user_id == user_id && stored.role_id == role_id
        }) else {
            return Ok(None);
        };

        stored.revoke(revoked_by, revoked_at);
        Ok(Some(stored.clone()))
    }

    async fn list_active_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let assignments = self.assignments.read().await;
        let roles = self.roles.read().await;

        Ok(roles
            .values()
            .filter(|role| {
                role.is_active
                    && assignments.iter().any(|assignment| {
                        assignment.is_active
                            && assignment.user_id == user_id
                            && assignment.role_id == role.id
                    })
            })
            .cloned()
            .collect())
    }

    async fn list_assignments_for_user(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        let mut listed: Vec<RoleAssignment> = assignments
            .iter()
            .filter(|stored| stored.user_id == user_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(listed)
    }
}

#[async_trait]
impl UserRepository for InMemoryAccessRepository {
    async fn insert_user(&self, user: User) -> AppResult<()> {
        let mut users = self.users.write().await;

        if users.values().any(|stored| stored.subject == user.subject) {
            return Err(AppError::Duplicate(format!(
                "user subject '{}' already exists",
                user.subject
            )));
        }

        users.insert(user.id, user);
        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_user_by_subject(&self, subject: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|stored| stored.subject == subject)
            .cloned())
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
