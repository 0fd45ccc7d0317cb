use std::sync::Arc;

use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::{PermissionName, UserId};

use super::listener::{MutationEvent, MutationListener};

/// Optional cache port for permission-check results.
///
/// The resolver never reads this cache; read-through wiring belongs to the
/// caller. The engine's contribution is [`CacheInvalidationListener`], which
/// drops stale entries when a mutation completes.
#[async_trait]
pub trait PermissionCheckCache: Send + Sync {
    /// Returns a cached check result for one `(user, permission)` key.
    async fn get_check(
        &self,
        user_id: UserId,
        permission: &PermissionName,
    ) -> AppResult<Option<bool>>;

    /// Stores a check result with a ttl.
    async fn set_check(
        &self,
        user_id: UserId,
        permission: &PermissionName,
        allowed: bool,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Drops every cached check for one user.
    async fn invalidate_user(&self, user_id: UserId) -> AppResult<()>;

    /// Drops every cached check.
    async fn invalidate_all(&self) -> AppResult<()>;
}

/// Mutation listener that invalidates a permission-check cache.
///
/// Assignment events touch a single user; catalog events may affect any user
/// holding the role and clear the whole cache.
#[derive(Clone)]
pub struct CacheInvalidationListener {
    cache: Arc<dyn PermissionCheckCache>,
}

impl CacheInvalidationListener {
    /// Creates a listener over a cache implementation.
    #[must_use]
    pub fn new(cache: Arc<dyn PermissionCheckCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl MutationListener for CacheInvalidationListener {
    async fn mutation_completed(&self, event: &MutationEvent) -> AppResult<()> {
        match event {
            MutationEvent::RoleAssigned { user_id, .. }
            | MutationEvent::RoleRevoked { user_id, .. } => {
                self.cache.invalidate_user(*user_id).await
            }
            MutationEvent::RolePermissionsUpdated { .. }
            | MutationEvent::RoleDeactivated { .. } => self.cache.invalidate_all().await,
        }
    }
}
