use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use gatewarden_application::RoleRepository;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{PermissionName, Role, RoleId, UserId};

/// PostgreSQL-backed repository for the role catalog.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    display_name: String,
    description: Option<String>,
    priority: i32,
    created_by: uuid::Uuid,
    is_active: bool,
    created_at: DateTime<Utc>,
    permission_name: Option<String>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO roles (
                id,
                name,
                display_name,
                description,
                priority,
                created_by,
                is_active,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.display_name.as_str())
        .bind(role.description.as_deref())
        .bind(role.priority)
        .bind(role.created_by.as_uuid())
        .bind(role.is_active)
        .bind(role.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, role.name.as_str()))?;

        persist_role_grants(&mut transaction, role.id, &role.permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.display_name,
                roles.description,
                roles.priority,
                roles.created_by,
                roles.is_active,
                roles.created_at,
                grants.permission_name
            FROM roles
            LEFT JOIN role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE roles.id = $1
            ORDER BY grants.position
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.display_name,
                roles.description,
                roles.priority,
                roles.created_by,
                roles.is_active,
                roles.created_at,
                grants.permission_name
            FROM roles
            LEFT JOIN role_permissions AS grants
                ON grants.role_id = roles.id
            ORDER BY roles.priority DESC, roles.name, grants.position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut roles = aggregate_roles(rows)?;
        roles.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(roles)
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let exists = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

        persist_role_grants(&mut transaction, role_id, permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }

    async fn set_role_active(&self, role_id: RoleId, is_active: bool) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE roles
            SET is_active = $2
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }
}

async fn persist_role_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
    permissions: &[PermissionName],
) -> AppResult<()> {
    for (position, permission) in permissions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_name, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, permission_name) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission.as_str())
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_grant_reference(error, permission))?;
    }

    Ok(())
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Duplicate(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}

fn map_grant_reference(error: sqlx::Error, permission: &PermissionName) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Reference(format!(
            "role references unknown permission '{permission}'"
        ));
    }

    AppError::Internal(format!("failed to persist role grants: {error}"))
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    let mut order: Vec<uuid::Uuid> = Vec::new();
    let mut by_id: HashMap<uuid::Uuid, Role> = HashMap::new();

    for row in rows {
        let role = by_id.entry(row.role_id).or_insert_with(|| {
            order.push(row.role_id);
            Role {
                id: RoleId::from_uuid(row.role_id),
                name: row.role_name.clone(),
                display_name: row.display_name.clone(),
                description: row.description.clone(),
                permissions: Vec::new(),
                priority: row.priority,
                created_by: UserId::from_uuid(row.created_by),
                is_active: row.is_active,
                created_at: row.created_at,
            }
        });

        if let Some(permission_name) = row.permission_name {
            let permission =
                PermissionName::from_str(permission_name.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored grant '{permission_name}' for role '{}': {error}",
                        row.role_name
                    ))
                })?;

            role.permissions.push(permission);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|role_id| by_id.remove(&role_id))
        .collect())
}
