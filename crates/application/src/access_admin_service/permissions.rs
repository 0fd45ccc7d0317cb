use chrono::Utc;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{AuditAction, Permission, PermissionId, PermissionName, UserId};

use crate::access_ports::CreatePermissionInput;
use crate::audit::AuditEvent;

use super::AccessAdminService;

impl AccessAdminService {
    /// Registers a new permission and emits an audit event.
    ///
    /// The store's unique constraint on the name decides duplicate races.
    pub async fn create_permission(
        &self,
        actor: UserId,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let name = PermissionName::new(input.name)?;
        let permission = Permission::new(
            PermissionId::new(),
            name,
            input.display_name,
            input.category,
            input.resource,
            input.action,
            input.description,
            Utc::now(),
        )?;

        self.permission_repository
            .insert_permission(permission.clone())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::PermissionCreated,
                resource_type: "permission".to_owned(),
                resource_id: permission.name.as_str().to_owned(),
                detail: Some(format!("registered permission '{}'", permission.name)),
            })
            .await?;

        Ok(permission)
    }

    /// Returns a permission by name.
    pub async fn get_permission(&self, name: &str) -> AppResult<Permission> {
        let name = PermissionName::new(name)?;

        self.permission_repository
            .find_permission(&name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{name}' was not found")))
    }

    /// Lists all registered permissions ordered by name.
    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.permission_repository.list_permissions().await
    }

    /// Deactivates a permission; the registry never hard-deletes.
    pub async fn deactivate_permission(&self, actor: UserId, name: &str) -> AppResult<()> {
        let name = PermissionName::new(name)?;

        self.permission_repository
            .set_permission_active(&name, false)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::PermissionDeactivated,
                resource_type: "permission".to_owned(),
                resource_id: name.as_str().to_owned(),
                detail: Some(format!("deactivated permission '{name}'")),
            })
            .await
    }
}
