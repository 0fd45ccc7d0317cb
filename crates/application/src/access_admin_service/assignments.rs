use chrono::Utc;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{AuditAction, Role, RoleAssignment, RoleId, UserId};

use crate::access_ports::{AssignRoleInput, AssignmentInsert, MutationEvent};
use crate::audit::AuditEvent;

use super::{AccessAdminService, AssignmentPolicy};

impl AccessAdminService {
    /// Assigns a role to a principal, appending a new active ledger row.
    ///
    /// An already-active pair follows the configured [`AssignmentPolicy`]:
    /// idempotent deployments get the existing row back unchanged, stricter
    /// ones get `Conflict`. The audit event and mutation signal fire only
    /// when a row was actually inserted.
    pub async fn assign_role(
        &self,
        actor: UserId,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let user = self
            .user_repository
            .find_user(input.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("user '{}' was not found", input.user_id))
            })?;

        let role = self.get_role(input.role_id).await?;
        if !role.is_active {
            return Err(AppError::NotFound(format!(
                "role '{}' is not active",
                role.name
            )));
        }

        let assignment =
            RoleAssignment::new(user.id, role.id, input.reason, actor, Utc::now());

        match self
            .assignment_repository
            .insert_assignment(assignment)
            .await?
        {
            AssignmentInsert::Inserted(row) => {
                self.audit_repository
                    .append_event(AuditEvent {
                        actor,
                        action: AuditAction::RoleAssigned,
                        resource_type: "role_assignment".to_owned(),
                        resource_id: format!("{}:{}", user.subject, role.name),
                        detail: Some(format!(
                            "assigned role '{}' to '{}'",
                            role.name, user.subject
                        )),
                    })
                    .await?;

                self.notify_mutation(MutationEvent::RoleAssigned {
                    user_id: user.id,
                    role_id: role.id,
                })
                .await?;

                Ok(row)
            }
            AssignmentInsert::AlreadyActive(existing) => match self.assignment_policy {
                AssignmentPolicy::Idempotent => Ok(existing),
                AssignmentPolicy::RejectDuplicate => Err(AppError::Conflict(format!(
                    "user '{}' already holds role '{}'",
                    user.subject, role.name
                ))),
            },
        }
    }

    /// Revokes a principal's active assignment for a role.
    ///
    /// The ledger row is stamped inactive, never deleted. Revoking a pair
    /// with no active row is a no-op success.
    pub async fn revoke_role(
        &self,
        actor: UserId,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let Some(revoked) = self
            .assignment_repository
            .revoke_assignment(user_id, role_id, actor, Utc::now())
            .await?
        else {
            return Ok(());
        };

        self.audit_repository
            .append_event(AuditEvent {
                actor,
                action: AuditAction::RoleRevoked,
                resource_type: "role_assignment".to_owned(),
                resource_id: revoked.id.to_string(),
                detail: Some(format!(
                    "revoked role '{role_id}' from user '{user_id}'"
                )),
            })
            .await?;

        self.notify_mutation(MutationEvent::RoleRevoked { user_id, role_id })
            .await
    }

    /// Lists a principal's active roles, priority descending with name
    /// ascending tiebreak.
    pub async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        self.require_user(user_id).await?;

        let mut roles = self
            .assignment_repository
            .list_active_roles_for_user(user_id)
            .await?;

        roles.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.name.cmp(&right.name))
        });

        Ok(roles)
    }

    /// Lists a principal's full assignment history, revoked rows included.
    pub async fn list_user_assignments(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.require_user(user_id).await?;

        self.assignment_repository
            .list_assignments_for_user(user_id)
            .await
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<()> {
        self.user_repository
            .find_user(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}
