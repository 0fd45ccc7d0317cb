//! Permission resolver over the assignment ledger and role catalog.

use std::collections::BTreeSet;
use std::sync::Arc;

use gatewarden_core::AppResult;
use gatewarden_domain::{PermissionName, UserId};

use crate::access_ports::AssignmentRepository;

/// Application service answering role and permission membership queries.
///
/// Every query reads the ledger lazily: there is no precomputed expansion
/// table and no engine-owned cache, so catalog and ledger edits take effect
/// on the next query without invalidation bookkeeping. For a fixed ledger
/// snapshot, repeated calls return identical results.
#[derive(Clone)]
pub struct AuthorizationService {
    assignment_repository: Arc<dyn AssignmentRepository>,
}

impl AuthorizationService {
    /// Creates a new resolver from a repository implementation.
    #[must_use]
    pub fn new(assignment_repository: Arc<dyn AssignmentRepository>) -> Self {
        Self {
            assignment_repository,
        }
    }

    /// Returns whether an active assignment links the user to a role with
    /// this name.
    pub async fn has_role(&self, user_id: UserId, role_name: &str) -> AppResult<bool> {
        let roles = self
            .assignment_repository
            .list_active_roles_for_user(user_id)
            .await?;

        Ok(roles.iter().any(|role| role.name == role_name))
    }

    /// Returns whether the union of the user's grants covers the requested
    /// permission.
    ///
    /// A grant matches exactly, as `resource:*`, or as `*:*`; matching is
    /// case-sensitive and priority never participates.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission_name: &str,
    ) -> AppResult<bool> {
        let requested = PermissionName::new(permission_name)?;

        let roles = self
            .assignment_repository
            .list_active_roles_for_user(user_id)
            .await?;

        Ok(roles.iter().any(|role| role.grants_permission(&requested)))
    }

    /// Returns the deduplicated union of grants across the user's active
    /// roles.
    pub async fn effective_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeSet<PermissionName>> {
        let roles = self
            .assignment_repository
            .list_active_roles_for_user(user_id)
            .await?;

        Ok(roles
            .into_iter()
            .flat_map(|role| role.permissions)
            .collect())
    }
}
