//! Composition root wiring the access engine to its adapters.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use gatewarden_application::{
    AccessAdminService, AuthorizationService, CacheInvalidationListener, PermissionCheckCache,
};
use gatewarden_core::{AppError, AppResult};

use crate::engine_config::EngineConfig;
use crate::postgres_assignment_repository::PostgresAssignmentRepository;
use crate::postgres_audit_repository::PostgresAuditRepository;
use crate::postgres_permission_repository::PostgresPermissionRepository;
use crate::postgres_role_repository::PostgresRoleRepository;
use crate::postgres_user_repository::PostgresUserRepository;
use crate::redis_permission_check_cache::RedisPermissionCheckCache;

/// Fully wired access engine.
///
/// Built once at process start and passed by reference to request handlers;
/// there is no ambient global instance.
#[derive(Clone)]
pub struct AccessEngine {
    /// Administrative operations over registry, catalog, and ledger.
    pub admin: AccessAdminService,
    /// Read-only role and permission resolution.
    pub authorization: AuthorizationService,
    /// Optional permission-check cache for caller-side read-through wiring.
    pub permission_check_cache: Option<Arc<dyn PermissionCheckCache>>,
}

impl AccessEngine {
    /// Connects to the backing store, applies migrations, and wires the
    /// services.
    pub async fn connect(config: &EngineConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(config.database_url.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to connect to database: {error}"))
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

        info!("database migrations applied");

        Self::from_pool(pool, config)
    }

    /// Wires the services over an existing pool.
    pub fn from_pool(pool: PgPool, config: &EngineConfig) -> AppResult<Self> {
        let permission_repository = Arc::new(PostgresPermissionRepository::new(pool.clone()));
        let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));
        let assignment_repository = Arc::new(PostgresAssignmentRepository::new(pool.clone()));
        let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
        let audit_repository = Arc::new(PostgresAuditRepository::new(pool));

        let mut admin = AccessAdminService::new(
            permission_repository,
            role_repository,
            assignment_repository.clone(),
            user_repository,
            audit_repository,
            config.assignment_policy,
        );

        let permission_check_cache: Option<Arc<dyn PermissionCheckCache>> =
            match config.redis_url.as_deref() {
                Some(redis_url) => {
                    let client = redis::Client::open(redis_url).map_err(|error| {
                        AppError::Validation(format!("invalid REDIS_URL: {error}"))
                    })?;

                    let cache: Arc<dyn PermissionCheckCache> = Arc::new(
                        RedisPermissionCheckCache::new(client, "gatewarden:permission_check"),
                    );

                    admin = admin.with_mutation_listener(Arc::new(
                        CacheInvalidationListener::new(cache.clone()),
                    ));

                    info!("permission-check cache invalidation wired to redis");
                    Some(cache)
                }
                None => None,
            };

        Ok(Self {
            admin,
            authorization: AuthorizationService::new(assignment_repository),
            permission_check_cache,
        })
    }
}
