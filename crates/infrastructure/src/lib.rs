//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod bootstrap;
mod engine_config;
mod in_memory_access_repository;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_permission_repository;
mod postgres_role_repository;
mod postgres_user_repository;
mod redis_permission_check_cache;

pub use bootstrap::AccessEngine;
pub use engine_config::EngineConfig;
pub use in_memory_access_repository::InMemoryAccessRepository;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_permission_check_cache::RedisPermissionCheckCache;
