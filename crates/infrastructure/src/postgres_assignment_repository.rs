use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use gatewarden_application::{AssignmentInsert, AssignmentRepository};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    AssignmentId, PermissionName, Role, RoleAssignment, RoleId, UserId,
};

/// PostgreSQL-backed repository for the append-only assignment ledger.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    reason: Option<String>,
    assigned_by: uuid::Uuid,
    is_active: bool,
    created_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by: Option<uuid::Uuid>,
}

impl AssignmentRow {
    fn into_assignment(self) -> RoleAssignment {
        RoleAssignment {
            id: AssignmentId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            role_id: RoleId::from_uuid(self.role_id),
            reason: self.reason,
            assigned_by: UserId::from_uuid(self.assigned_by),
            is_active: self.is_active,
            created_at: self.created_at,
            revoked_at: self.revoked_at,
            revoked_by: self.revoked_by.map(UserId::from_uuid),
        }
    }
}

#[derive(Debug, FromRow)]
struct ActiveRoleRow {
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
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert_assignment(
        &self,
        assignment: RoleAssignment,
    ) -> AppResult<AssignmentInsert> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        // The partial unique index on (user_id, role_id) WHERE is_active
        // decides duplicate-active races; no check-then-act on our side.
        let inserted = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO role_assignments (
                id,
                user_id,
                role_id,
                reason,
                assigned_by,
                is_active,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $6)
            ON CONFLICT (user_id, role_id) WHERE is_active DO NOTHING
            RETURNING id, user_id, role_id, reason, assigned_by,
                is_active, created_at, revoked_at, revoked_by
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.reason.as_deref())
        .bind(assignment.assigned_by.as_uuid())
        .bind(assignment.created_at)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(map_assignment_reference)?;

        let outcome = match inserted {
            Some(row) => AssignmentInsert::Inserted(row.into_assignment()),
            None => {
                let existing = sqlx::query_as::<_, AssignmentRow>(
                    r#"
                    SELECT id, user_id, role_id, reason, assigned_by,
                        is_active, created_at, revoked_at, revoked_by
                    FROM role_assignments
                    WHERE user_id = $1 AND role_id = $2 AND is_active
                    LIMIT 1
                    "#,
                )
                .bind(assignment.user_id.as_uuid())
                .bind(assignment.role_id.as_uuid())
                .fetch_optional(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to resolve active assignment: {error}"
                    ))
                })?
                .ok_or_else(|| {
                    AppError::Internal(
                        "active assignment vanished during insert".to_owned(),
                    )
                })?;

                AssignmentInsert::AlreadyActive(existing.into_assignment())
            }
        };

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(outcome)
    }

    async fn revoke_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        revoked_by: UserId,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<RoleAssignment>> {
        let revoked = sqlx::query_as::<_, AssignmentRow>(
            r#"
            UPDATE role_assignments
            SET is_active = FALSE, revoked_at = $3, revoked_by = $4
            WHERE user_id = $1 AND role_id = $2 AND is_active
            RETURNING id, user_id, role_id, reason, assigned_by,
                is_active, created_at, revoked_at, revoked_by
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(revoked_at)
        .bind(revoked_by.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to revoke assignment: {error}"))
        })?;

        Ok(revoked.map(AssignmentRow::into_assignment))
    }

    async fn list_active_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, ActiveRoleRow>(
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
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            LEFT JOIN role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE assignments.user_id = $1
                AND assignments.is_active
                AND roles.is_active
            ORDER BY roles.priority DESC, roles.name, grants.position
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list roles for user: {error}"))
        })?;

        aggregate_active_roles(rows)
    }

    async fn list_assignments_for_user(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, reason, assigned_by,
                is_active, created_at, revoked_at, revoked_by
            FROM role_assignments
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignments: {error}"))
        })?;

        Ok(rows.into_iter().map(AssignmentRow::into_assignment).collect())
    }
}

fn map_assignment_reference(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound("user or role was not found".to_owned());
    }

    AppError::Internal(format!("failed to insert assignment: {error}"))
}

fn aggregate_active_roles(rows: Vec<ActiveRoleRow>) -> AppResult<Vec<Role>> {
    let mut roles: Vec<Role> = Vec::new();

    for row in rows {
        if roles.last().map(|role| role.id.as_uuid()) != Some(row.role_id) {
            roles.push(Role {
                id: RoleId::from_uuid(row.role_id),
                name: row.role_name.clone(),
                display_name: row.display_name,
                description: row.description,
                permissions: Vec::new(),
                priority: row.priority,
                created_by: UserId::from_uuid(row.created_by),
                is_active: row.is_active,
                created_at: row.created_at,
            });
        }

        if let Some(permission_name) = row.permission_name
            && let Some(role) = roles.last_mut()
        {
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

    Ok(roles)
}
