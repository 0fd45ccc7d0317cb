use chrono::Utc;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{AuditAction, PermissionName, Role, RoleId, UserId};

use crate::access_ports::{CreateRoleInput, MutationEvent};
use crate::audit::AuditEvent;

use super::AccessAdminService;

impl AccessAdminService {
    /// Creates a role and emits an audit event.
    ///
    /// Every grant must reference a registered permission; the check runs at
    /// mutation time, never lazily at query time.
    pub async fn create_role(&self, actor: UserId, input: CreateRoleInput) -> AppResult<Role> {
        let permissions = parse_grant_list(input.permissions)?;
        self.require_known_permissions(&permissions).await?;

        let role = Role::new(
            RoleId::new(),
            input.name,
            input.display_name,
            input.description,
            permissions,
            input.priority,
            actor,
            Utc::now(),
        )?;

        self.role_repository.insert_role(role.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::RoleCreated,
                resource_type: "role".to_owned(),
                resource_id: role.name.clone(),
                detail: Some(format!(
                    "created role '{}' with {} grants",
                    role.name,
                    role.permissions.len()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Atomically replaces a role's grant list and signals the mutation.
    pub async fn update_role_permissions(
        &self,
        actor: UserId,
        role_id: RoleId,
        permissions: Vec<String>,
    ) -> AppResult<Role> {
        let permissions = parse_grant_list(permissions)?;
        self.require_known_permissions(&permissions).await?;

        self.role_repository
            .replace_role_permissions(role_id, &permissions)
            .await?;

        let role = self.get_role(role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::RolePermissionsUpdated,
                resource_type: "role".to_owned(),
                resource_id: role.name.clone(),
                detail: Some(format!(
                    "replaced grants of role '{}' with {} entries",
                    role.name,
                    role.permissions.len()
                )),
            })
            .await?;

        self.notify_mutation(MutationEvent::RolePermissionsUpdated { role_id })
            .await?;

        Ok(role)
    }

    /// Returns a role by identifier.
    pub async fn get_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.role_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Lists all roles ordered by priority descending, then name ascending.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.role_repository.list_roles().await
    }

    /// Deactivates a role and signals the mutation; the catalog never
    /// hard-deletes.
    pub async fn deactivate_role(&self, actor: UserId, role_id: RoleId) -> AppResult<()> {
        let role = self.get_role(role_id).await?;

        self.role_repository.set_role_active(role_id, false).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::RoleDeactivated,
                resource_type: "role".to_owned(),
                resource_id: role.name.clone(),
                detail: Some(format!("deactivated role '{}'", role.name)),
            })
            .await?;

        self.notify_mutation(MutationEvent::RoleDeactivated { role_id })
            .await
    }

    async fn require_known_permissions(&self, permissions: &[PermissionName]) -> AppResult<()> {
        let missing = self
            .permission_repository
            .find_missing_permissions(permissions)
            .await?;

        if missing.is_empty() {
            return Ok(());
        }

        let names = missing
            .iter()
            .map(PermissionName::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Err(AppError::Reference(format!(
            "role references unknown permissions: {names}"
        )))
    }
}

fn parse_grant_list(values: Vec<String>) -> AppResult<Vec<PermissionName>> {
    let parsed = values
        .into_iter()
        .map(PermissionName::new)
        .collect::<AppResult<Vec<_>>>()?;

    // Grant lists are ordered sets; drop repeats, keep first occurrence.
    let mut seen = std::collections::HashSet::new();
    Ok(parsed
        .into_iter()
        .filter(|grant| seen.insert(grant.clone()))
        .collect())
}
