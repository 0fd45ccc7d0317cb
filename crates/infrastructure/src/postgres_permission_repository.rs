use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use gatewarden_application::PermissionRepository;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{Permission, PermissionId, PermissionName};

/// PostgreSQL-backed repository for the permission registry.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    name: String,
    display_name: String,
    description: Option<String>,
    category: String,
    resource: String,
    action: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        let name = PermissionName::from_str(self.name.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored permission name '{}': {error}",
                self.name
            ))
        })?;

        Ok(Permission {
            id: PermissionId::from_uuid(self.id),
            name,
            display_name: self.display_name,
            description: self.description,
            category: self.category,
            resource: self.resource,
            action: self.action,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permissions (
                id,
                name,
                display_name,
                description,
                category,
                resource,
                action,
                is_active,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(permission.id.as_uuid())
        .bind(permission.name.as_str())
        .bind(permission.display_name.as_str())
        .bind(permission.description.as_deref())
        .bind(permission.category.as_str())
        .bind(permission.resource.as_str())
        .bind(permission.action.as_str())
        .bind(permission.is_active)
        .bind(permission.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| map_permission_conflict(error, permission.name.as_str()))?;

        Ok(())
    }

    async fn find_permission(&self, name: &PermissionName) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, display_name, description, category,
                resource, action, is_active, created_at
            FROM permissions
            WHERE name = $1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, display_name, description, category,
                resource, action, is_active, created_at
            FROM permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter()
            .map(PermissionRow::into_permission)
            .collect()
    }

    async fn find_missing_permissions(
        &self,
        names: &[PermissionName],
    ) -> AppResult<Vec<PermissionName>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let requested: Vec<String> = names
            .iter()
            .map(|name| name.as_str().to_owned())
            .collect();

        let known: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM permissions
            WHERE name = ANY($1)
            "#,
        )
        .bind(requested.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve permission names: {error}"))
        })?;

        Ok(names
            .iter()
            .filter(|name| !known.iter().any(|value| value == name.as_str()))
            .cloned()
            .collect())
    }

    async fn set_permission_active(
        &self,
        name: &PermissionName,
        is_active: bool,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE permissions
            SET is_active = $2
            WHERE name = $1
            "#,
        )
        .bind(name.as_str())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{name}' was not found"
            )));
        }

        Ok(())
    }
}

fn map_permission_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Duplicate(format!("permission '{name}' already exists"));
    }

    AppError::Internal(format!("failed to create permission: {error}"))
}
