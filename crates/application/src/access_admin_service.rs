//! Administrative service over the permission registry, role catalog, and
//! assignment ledger.

mod assignments;
mod batch;
mod permissions;
mod roles;
mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use gatewarden_core::AppResult;

use crate::access_ports::{
    AssignmentRepository, MutationEvent, MutationListener, PermissionRepository, RoleRepository,
    UserRepository,
};
use crate::audit::AuditRepository;

/// Behavior when assigning a pair that already has an active assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssignmentPolicy {
    /// Return the existing active row unchanged.
    #[default]
    Idempotent,
    /// Fail the operation with `Conflict`.
    RejectDuplicate,
}

/// Application service for access-control administration.
#[derive(Clone)]
pub struct AccessAdminService {
    permission_repository: Arc<dyn PermissionRepository>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    user_repository: Arc<dyn UserRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    mutation_listeners: Vec<Arc<dyn MutationListener>>,
    assignment_policy: AssignmentPolicy,
}

impl AccessAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permission_repository: Arc<dyn PermissionRepository>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        user_repository: Arc<dyn UserRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        assignment_policy: AssignmentPolicy,
    ) -> Self {
        Self {
            permission_repository,
            role_repository,
            assignment_repository,
            user_repository,
            audit_repository,
            mutation_listeners: Vec::new(),
            assignment_policy,
        }
    }

    /// Subscribes a listener to the mutation-completed signal.
    #[must_use]
    pub fn with_mutation_listener(mut self, listener: Arc<dyn MutationListener>) -> Self {
        self.mutation_listeners.push(listener);
        self
    }

    async fn notify_mutation(&self, event: MutationEvent) -> AppResult<()> {
        for listener in &self.mutation_listeners {
            listener.mutation_completed(&event).await?;
        }

        Ok(())
    }
}
