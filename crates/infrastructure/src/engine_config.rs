use std::env;

use gatewarden_application::AssignmentPolicy;
use gatewarden_core::{AppError, AppResult};

/// Default connection pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Runtime configuration for the access engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Maximum pooled connections.
    pub database_max_connections: u32,
    /// Optional Redis connection string for the permission-check cache.
    pub redis_url: Option<String>,
    /// Behavior when assigning an already-active pair.
    pub assignment_policy: AssignmentPolicy,
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    ///
    /// `DATABASE_URL` is required. `DATABASE_MAX_CONNECTIONS` defaults to 10,
    /// `REDIS_URL` is optional, and `ASSIGNMENT_POLICY` accepts `idempotent`
    /// (default) or `reject_duplicate`.
    pub fn from_env() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let assignment_policy = match env::var("ASSIGNMENT_POLICY")
            .unwrap_or_else(|_| "idempotent".to_owned())
            .as_str()
        {
            "idempotent" => AssignmentPolicy::Idempotent,
            "reject_duplicate" => AssignmentPolicy::RejectDuplicate,
            other => {
                return Err(AppError::Validation(format!(
                    "ASSIGNMENT_POLICY must be 'idempotent' or 'reject_duplicate', got '{other}'"
                )));
            }
        };

        Ok(Self {
            database_url,
            database_max_connections,
            redis_url,
            assignment_policy,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
