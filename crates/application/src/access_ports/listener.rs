use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::{RoleId, UserId};

/// Mutation-completed signal published after a successful ledger or catalog
/// write.
///
/// External read-through caches key on `(user_id, permission_name)`; the
/// event carries enough to know which cached checks may be stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    /// A new active assignment was inserted.
    RoleAssigned {
        /// Principal that received the role.
        user_id: UserId,
        /// Assigned role.
        role_id: RoleId,
    },
    /// An active assignment was revoked.
    RoleRevoked {
        /// Principal that lost the role.
        user_id: UserId,
        /// Revoked role.
        role_id: RoleId,
    },
    /// A role's grant list was replaced.
    RolePermissionsUpdated {
        /// Updated role.
        role_id: RoleId,
    },
    /// A role was deactivated.
    RoleDeactivated {
        /// Deactivated role.
        role_id: RoleId,
    },
}

/// Subscriber port for the mutation-completed signal.
///
/// Listeners run synchronously: the mutating call returns only after every
/// listener has been awaited.
#[async_trait]
pub trait MutationListener: Send + Sync {
    /// Handles one completed mutation.
    async fn mutation_completed(&self, event: &MutationEvent) -> AppResult<()>;
}
