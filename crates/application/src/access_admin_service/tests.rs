use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    Permission, PermissionName, Role, RoleAssignment, RoleId, User, UserId,
};

use crate::access_ports::{
    AssignRoleInput, AssignmentInsert, AssignmentRepository, BatchAction, BatchRoleInput,
    CreatePermissionInput, CreateRoleInput, MutationEvent, MutationListener,
    PermissionRepository, RegisterUserInput, RoleRepository, UserRepository,
};
use crate::audit::{AuditEvent, AuditRepository};
use crate::authorization_service::AuthorizationService;

use super::{AccessAdminService, AssignmentPolicy};

#[derive(Default)]
struct FakeAccessStore {
    permissions: Mutex<Vec<Permission>>,
    roles: Mutex<Vec<Role>>,
    assignments: Mutex<Vec<RoleAssignment>>,
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl PermissionRepository for FakeAccessStore {
    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut permissions = self.permissions.lock().await;
        if permissions.iter().any(|stored| stored.name == permission.name) {
            return Err(AppError::Duplicate(format!(
                "permission '{}' already exists",
                permission.name
            )));
        }

        permissions.push(permission);
        Ok(())
    }

    async fn find_permission(&self, name: &PermissionName) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .find(|stored| &stored.name == name)
            .cloned())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut listed = self.permissions.lock().await.clone();
        listed.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(listed)
    }

    async fn find_missing_permissions(
        &self,
        names: &[PermissionName],
    ) -> AppResult<Vec<PermissionName>> {
        let permissions = self.permissions.lock().await;
        Ok(names
            .iter()
            .filter(|name| !permissions.iter().any(|stored| &stored.name == *name))
            .cloned()
            .collect())
    }

    async fn set_permission_active(
        &self,
        name: &PermissionName,
        is_active: bool,
    ) -> AppResult<()> {
        let mut permissions = self.permissions.lock().await;
        let Some(stored) = permissions.iter_mut().find(|stored| &stored.name == name) else {
            return Err(AppError::NotFound(format!(
                "permission '{name}' was not found"
            )));
        };

        stored.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for FakeAccessStore {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        if roles.iter().any(|stored| stored.name == role.name) {
            return Err(AppError::Duplicate(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        roles.push(role);
        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|stored| stored.id == role_id)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut listed = self.roles.lock().await.clone();
        listed.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(listed)
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[PermissionName],
    ) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let Some(stored) = roles.iter_mut().find(|stored| stored.id == role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        stored.permissions = permissions.to_vec();
        Ok(())
    }

    async fn set_role_active(&self, role_id: RoleId, is_active: bool) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let Some(stored) = roles.iter_mut().find(|stored| stored.id == role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        stored.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for FakeAccessStore {
    async fn insert_assignment(
        &self,
        assignment: RoleAssignment,
    ) -> AppResult<AssignmentInsert> {
        let mut assignments = self.assignments.lock().await;
        if let Some(existing) = assignments.iter().find(|stored| {
            stored.is_active
                && stored.user_id == assignment.user_id
                && stored.role_id == assignment.role_id
        }) {
            return Ok(AssignmentInsert::AlreadyActive(existing.clone()));
        }

        assignments.push(assignment.clone());
        Ok(AssignmentInsert::Inserted(assignment))
    }

    async fn revoke_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        revoked_by: UserId,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<RoleAssignment>> {
        let mut assignments = self.assignments.lock().await;
        let Some(stored) = assignments.iter_mut().find(|stored| {
            stored.is_active && stored.user_id == user_id && stored.role_id == role_id
        }) else {
            return Ok(None);
        };

        stored.revoke(revoked_by, revoked_at);
        Ok(Some(stored.clone()))
    }

    async fn list_active_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let assignments = self.assignments.lock().await;
        let roles = self.roles.lock().await;

        Ok(roles
            .iter()
            .filter(|role| {
                role.is_active
                    && assignments.iter().any(|assignment| {
                        assignment.is_active
                            && assignment.user_id == user_id
                            && assignment.role_id == role.id
                    })
            })
            .cloned()
            .collect())
    }

    async fn list_assignments_for_user(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut listed: Vec<RoleAssignment> = self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|stored| stored.user_id == user_id)
            .cloned()
            .collect();
        listed.reverse();
        Ok(listed)
    }
}

#[async_trait]
impl UserRepository for FakeAccessStore {
    async fn insert_user(&self, user: User) -> AppResult<()> {
        let mut users = self.users.lock().await;
        if users.iter().any(|stored| stored.subject == user.subject) {
            return Err(AppError::Duplicate(format!(
                "user subject '{}' already exists",
                user.subject
            )));
        }

        users.push(user);
        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|stored| stored.id == user_id)
            .cloned())
    }

    async fn find_user_by_subject(&self, subject: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|stored| stored.subject == subject)
            .cloned())
    }
}

#[derive(Default)]
struct RecordingAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<MutationEvent>>,
}

#[async_trait]
impl MutationListener for RecordingListener {
    async fn mutation_completed(&self, event: &MutationEvent) -> AppResult<()> {
        self.events.lock().await.push(*event);
        Ok(())
    }
}

struct Harness {
    service: AccessAdminService,
    authorization: AuthorizationService,
    audit: Arc<RecordingAuditRepository>,
    listener: Arc<RecordingListener>,
}

fn harness(policy: AssignmentPolicy) -> Harness {
    let store = Arc::new(FakeAccessStore::default());
    let audit = Arc::new(RecordingAuditRepository::default());
    let listener = Arc::new(RecordingListener::default());

    let service = AccessAdminService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        audit.clone(),
        policy,
    )
    .with_mutation_listener(listener.clone());

    Harness {
        service,
        authorization: AuthorizationService::new(store),
        audit,
        listener,
    }
}

fn actor() -> UserId {
    UserId::new()
}

async fn seed_user(harness: &Harness, subject: &str) -> UserId {
    let user = harness
        .service
        .register_user(RegisterUserInput {
            subject: subject.to_owned(),
            display_name: subject.to_owned(),
        })
        .await;
    user.map(|user| user.id)
        .unwrap_or_else(|error| panic!("failed to seed user '{subject}': {error}"))
}

async fn seed_permission(harness: &Harness, actor: UserId, name: &str) {
    let Some((resource, action)) = name.split_once(':') else {
        panic!("invalid seed permission '{name}'");
    };

    let created = harness
        .service
        .create_permission(
            actor,
            CreatePermissionInput {
                name: name.to_owned(),
                display_name: name.to_owned(),
                category: "test".to_owned(),
                resource: resource.to_owned(),
                action: action.to_owned(),
                description: None,
            },
        )
        .await;
    assert!(created.is_ok(), "failed to seed permission '{name}'");
}

async fn seed_role(
    harness: &Harness,
    actor: UserId,
    name: &str,
    permissions: &[&str],
    priority: i32,
) -> RoleId {
    let role = harness
        .service
        .create_role(
            actor,
            CreateRoleInput {
                name: name.to_owned(),
                display_name: name.to_owned(),
                description: None,
                permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
                priority,
            },
        )
        .await;
    role.map(|role| role.id)
        .unwrap_or_else(|error| panic!("failed to seed role '{name}': {error}"))
}

#[tokio::test]
async fn created_permission_roundtrips_through_get() {
    let harness = harness(AssignmentPolicy::Idempotent);

    let created = harness
        .service
        .create_permission(
            actor(),
            CreatePermissionInput {
                name: "admin:view".to_owned(),
                display_name: "View admin area".to_owned(),
                category: "admin".to_owned(),
                resource: "admin".to_owned(),
                action: "view".to_owned(),
                description: Some("read-only admin access".to_owned()),
            },
        )
        .await;
    assert!(created.is_ok());

    let fetched = harness.service.get_permission("admin:view").await;
    assert_eq!(created.ok(), fetched.ok());
}

#[tokio::test]
async fn duplicate_permission_name_is_rejected() {
    let harness = harness(AssignmentPolicy::Idempotent);
    seed_permission(&harness, actor(), "admin:view").await;

    let duplicate = harness
        .service
        .create_permission(
            actor(),
            CreatePermissionInput {
                name: "admin:view".to_owned(),
                display_name: "View admin area".to_owned(),
                category: "admin".to_owned(),
                resource: "admin".to_owned(),
                action: "view".to_owned(),
                description: None,
            },
        )
        .await;

    assert!(matches!(duplicate, Err(AppError::Duplicate(_))));
}

#[tokio::test]
async fn permission_name_must_match_segments() {
    let harness = harness(AssignmentPolicy::Idempotent);

    let mismatched = harness
        .service
        .create_permission(
            actor(),
            CreatePermissionInput {
                name: "admin:view".to_owned(),
                display_name: "View admin area".to_owned(),
                category: "admin".to_owned(),
                resource: "user".to_owned(),
                action: "view".to_owned(),
                description: None,
            },
        )
        .await;

    assert!(matches!(mismatched, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn unknown_permission_lookup_is_not_found() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let missing = harness.service.get_permission("admin:view").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn role_with_unknown_grant_is_rejected() {
    let harness = harness(AssignmentPolicy::Idempotent);
    seed_permission(&harness, actor(), "admin:view").await;

    let role = harness
        .service
        .create_role(
            actor(),
            CreateRoleInput {
                name: "ops".to_owned(),
                display_name: "Operations".to_owned(),
                description: None,
                permissions: vec!["admin:view".to_owned(), "billing:export".to_owned()],
                priority: 0,
            },
        )
        .await;

    assert!(matches!(role, Err(AppError::Reference(_))));
}

#[tokio::test]
async fn duplicate_role_name_is_rejected() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    seed_role(&harness, admin, "ops", &[], 0).await;

    let duplicate = harness
        .service
        .create_role(
            admin,
            CreateRoleInput {
                name: "ops".to_owned(),
                display_name: "Operations".to_owned(),
                description: None,
                permissions: Vec::new(),
                priority: 0,
            },
        )
        .await;

    assert!(matches!(duplicate, Err(AppError::Duplicate(_))));
}

#[tokio::test]
async fn role_priority_out_of_range_is_rejected() {
    let harness = harness(AssignmentPolicy::Idempotent);

    let role = harness
        .service
        .create_role(
            actor(),
            CreateRoleInput {
                name: "ops".to_owned(),
                display_name: "Operations".to_owned(),
                description: None,
                permissions: Vec::new(),
                priority: -5,
            },
        )
        .await;

    assert!(matches!(role, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn update_role_permissions_replaces_grants_and_signals() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    seed_permission(&harness, admin, "admin:view").await;
    seed_permission(&harness, admin, "test:manage").await;
    let role_id = seed_role(&harness, admin, "ops", &["admin:view"], 0).await;

    let updated = harness
        .service
        .update_role_permissions(admin, role_id, vec!["test:manage".to_owned()])
        .await;

    assert_eq!(
        updated.map(|role| role.permissions).ok(),
        PermissionName::new("test:manage").map(|name| vec![name]).ok()
    );
    assert_eq!(
        harness.listener.events.lock().await.as_slice(),
        &[MutationEvent::RolePermissionsUpdated { role_id }]
    );
}

#[tokio::test]
async fn update_role_permissions_checks_references() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let updated = harness
        .service
        .update_role_permissions(admin, role_id, vec!["billing:export".to_owned()])
        .await;

    assert!(matches!(updated, Err(AppError::Reference(_))));
}

#[tokio::test]
async fn assign_to_unknown_user_is_not_found() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id: UserId::new(),
                role_id,
                reason: None,
            },
        )
        .await;

    assert!(matches!(assigned, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn assign_unknown_or_inactive_role_is_not_found() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;

    let unknown = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id: RoleId::new(),
                reason: None,
            },
        )
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;
    let deactivated = harness.service.deactivate_role(admin, role_id).await;
    assert!(deactivated.is_ok());

    let inactive = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(matches!(inactive, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn double_assign_is_idempotent_with_one_active_row() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let first = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: Some("onboarding".to_owned()),
            },
        )
        .await;
    let second = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: Some("retry".to_owned()),
            },
        )
        .await;

    assert_eq!(
        first.map(|row| row.id).ok(),
        second.map(|row| row.id).ok(),
        "second assign must return the existing row"
    );

    let history = harness.service.list_user_assignments(user_id).await;
    assert_eq!(history.map(|rows| rows.len()).ok(), Some(1));

    // The duplicate attempt must not re-emit audit events or signals.
    let assigned_events = harness
        .listener
        .events
        .lock()
        .await
        .iter()
        .filter(|event| matches!(event, MutationEvent::RoleAssigned { .. }))
        .count();
    assert_eq!(assigned_events, 1);
}

#[tokio::test]
async fn strict_policy_rejects_duplicate_assign() {
    let harness = harness(AssignmentPolicy::RejectDuplicate);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let first = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(first.is_ok());

    let second = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn revocation_keeps_ledger_history_and_reassignment_opens_new_row() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(assigned.is_ok());

    let revoked = harness.service.revoke_role(admin, user_id, role_id).await;
    assert!(revoked.is_ok());

    let held = harness.authorization.has_role(user_id, "ops").await;
    assert_eq!(held.ok(), Some(false));

    let reassigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(reassigned.is_ok());

    let history = harness
        .service
        .list_user_assignments(user_id)
        .await
        .unwrap_or_default();
    assert_eq!(history.len(), 2, "ledger must retain the revoked row");
    assert_eq!(
        history.iter().filter(|row| !row.is_active).count(),
        1,
        "exactly one row is revoked"
    );
    assert!(
        history
            .iter()
            .filter(|row| !row.is_active)
            .all(|row| row.revoked_at.is_some()),
        "revoked rows carry a revocation timestamp"
    );
}

#[tokio::test]
async fn revoking_without_active_assignment_is_a_noop() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let revoked = harness.service.revoke_role(admin, user_id, role_id).await;
    assert!(revoked.is_ok());
    assert!(harness.listener.events.lock().await.is_empty());
}

#[tokio::test]
async fn user_roles_sort_by_priority_then_name() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;

    let low = seed_role(&harness, admin, "zeta", &[], 10).await;
    let high = seed_role(&harness, admin, "ops", &[], 50).await;
    let tied = seed_role(&harness, admin, "audit", &[], 10).await;

    for role_id in [low, high, tied] {
        let assigned = harness
            .service
            .assign_role(
                admin,
                AssignRoleInput {
                    user_id,
                    role_id,
                    reason: None,
                },
            )
            .await;
        assert!(assigned.is_ok());
    }

    let names: Option<Vec<String>> = harness
        .service
        .list_user_roles(user_id)
        .await
        .map(|roles| roles.into_iter().map(|role| role.name).collect())
        .ok();

    assert_eq!(
        names,
        Some(vec![
            "ops".to_owned(),
            "audit".to_owned(),
            "zeta".to_owned()
        ])
    );
}

#[tokio::test]
async fn batch_assign_processes_every_pair() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let users = [
        seed_user(&harness, "alice").await,
        seed_user(&harness, "bob").await,
        seed_user(&harness, "carol").await,
    ];
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let outcome = harness
        .service
        .batch_assign_roles(
            admin,
            BatchRoleInput {
                user_ids: users.to_vec(),
                role_ids: vec![role_id],
                action: BatchAction::Assign,
                reason: Some("quarterly access review".to_owned()),
            },
        )
        .await;

    let outcome = outcome.unwrap_or_default();
    assert_eq!(outcome.succeeded.len(), 3);
    assert_eq!(outcome.failed.len(), 0);
    assert_eq!(outcome.processed(), 3);
}

#[tokio::test]
async fn batch_isolates_per_pair_failures() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let mut users = vec![
        seed_user(&harness, "alice").await,
        seed_user(&harness, "bob").await,
        seed_user(&harness, "carol").await,
    ];
    let unknown_user = UserId::new();
    users.push(unknown_user);
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let outcome = harness
        .service
        .batch_assign_roles(
            admin,
            BatchRoleInput {
                user_ids: users,
                role_ids: vec![role_id],
                action: BatchAction::Assign,
                reason: None,
            },
        )
        .await;

    let outcome = outcome.unwrap_or_default();
    assert_eq!(outcome.succeeded.len(), 3);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.processed(), 4);
    assert_eq!(
        outcome.failed.first().map(|failure| failure.user_id),
        Some(unknown_user)
    );
}

#[tokio::test]
async fn batch_rejects_empty_inputs() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();

    let empty_users = harness
        .service
        .batch_assign_roles(
            admin,
            BatchRoleInput {
                user_ids: Vec::new(),
                role_ids: vec![RoleId::new()],
                action: BatchAction::Assign,
                reason: None,
            },
        )
        .await;
    assert!(matches!(empty_users, Err(AppError::Validation(_))));

    let empty_roles = harness
        .service
        .batch_assign_roles(
            admin,
            BatchRoleInput {
                user_ids: vec![UserId::new()],
                role_ids: Vec::new(),
                action: BatchAction::Revoke,
                reason: None,
            },
        )
        .await;
    assert!(matches!(empty_roles, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn batch_revoke_clears_assignments() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(assigned.is_ok());

    let outcome = harness
        .service
        .batch_assign_roles(
            admin,
            BatchRoleInput {
                user_ids: vec![user_id],
                role_ids: vec![role_id],
                action: BatchAction::Revoke,
                reason: None,
            },
        )
        .await;

    assert_eq!(
        outcome.map(|outcome| outcome.succeeded.len()).ok(),
        Some(1)
    );
    assert_eq!(
        harness.authorization.has_role(user_id, "ops").await.ok(),
        Some(false)
    );
}

#[tokio::test]
async fn assignment_mutations_emit_audit_events_and_signals() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    let role_id = seed_role(&harness, admin, "ops", &[], 0).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(assigned.is_ok());

    let revoked = harness.service.revoke_role(admin, user_id, role_id).await;
    assert!(revoked.is_ok());

    assert_eq!(
        harness.listener.events.lock().await.as_slice(),
        &[
            MutationEvent::RoleAssigned { user_id, role_id },
            MutationEvent::RoleRevoked { user_id, role_id },
        ]
    );

    let audited: Vec<_> = harness
        .audit
        .events
        .lock()
        .await
        .iter()
        .map(|event| event.action)
        .collect();
    assert!(audited.contains(&gatewarden_domain::AuditAction::RoleAssigned));
    assert!(audited.contains(&gatewarden_domain::AuditAction::RoleRevoked));
}

#[tokio::test]
async fn duplicate_subject_registration_is_rejected() {
    let harness = harness(AssignmentPolicy::Idempotent);
    seed_user(&harness, "alice").await;

    let duplicate = harness
        .service
        .register_user(RegisterUserInput {
            subject: "alice".to_owned(),
            display_name: "Alice".to_owned(),
        })
        .await;

    assert!(matches!(duplicate, Err(AppError::Duplicate(_))));
}

#[tokio::test]
async fn granted_role_resolves_exact_permission_checks() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    seed_permission(&harness, admin, "test:manage").await;
    let role_id = seed_role(&harness, admin, "ops", &["test:manage"], 50).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(assigned.is_ok());

    assert_eq!(
        harness
            .authorization
            .has_permission(user_id, "test:manage")
            .await
            .ok(),
        Some(true)
    );
    assert_eq!(
        harness
            .authorization
            .has_permission(user_id, "test:other")
            .await
            .ok(),
        Some(false)
    );
}

#[tokio::test]
async fn deactivated_role_stops_granting_permissions() {
    let harness = harness(AssignmentPolicy::Idempotent);
    let admin = actor();
    let user_id = seed_user(&harness, "alice").await;
    seed_permission(&harness, admin, "admin:view").await;
    let role_id = seed_role(&harness, admin, "ops", &["admin:view"], 0).await;

    let assigned = harness
        .service
        .assign_role(
            admin,
            AssignRoleInput {
                user_id,
                role_id,
                reason: None,
            },
        )
        .await;
    assert!(assigned.is_ok());

    let deactivated = harness.service.deactivate_role(admin, role_id).await;
    assert!(deactivated.is_ok());

    assert_eq!(
        harness
            .authorization
            .has_permission(user_id, "admin:view")
            .await
            .ok(),
        Some(false)
    );
}
