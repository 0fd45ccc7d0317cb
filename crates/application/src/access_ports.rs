//! Ports consumed by the access-control services.

mod cache;
mod inputs;
mod listener;
mod repositories;

pub use cache::{CacheInvalidationListener, PermissionCheckCache};
pub use inputs::{
    AssignRoleInput, BatchAction, BatchFailure, BatchPair, BatchRoleInput, BatchRoleOutcome,
    CreatePermissionInput, CreateRoleInput, RegisterUserInput,
};
pub use listener::{MutationEvent, MutationListener};
pub use repositories::{
    AssignmentInsert, AssignmentRepository, PermissionRepository, RoleRepository, UserRepository,
};
