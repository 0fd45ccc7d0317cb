use chrono::Utc;
use gatewarden_core::{AppError, AppResult, NonEmptyString};
use gatewarden_domain::{AuditAction, User, UserId};

use crate::access_ports::RegisterUserInput;
use crate::audit::AuditEvent;

use super::AccessAdminService;

impl AccessAdminService {
    /// Registers a principal so the ledger's references resolve.
    pub async fn register_user(&self, input: RegisterUserInput) -> AppResult<User> {
        let subject = NonEmptyString::new(input.subject)?;
        let display_name = NonEmptyString::new(input.display_name)?;

        let user = User::new(
            UserId::new(),
            subject.as_str(),
            display_name.as_str(),
            Utc::now(),
        );

        self.user_repository.insert_user(user.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: user.id,
                action: AuditAction::UserRegistered,
                resource_type: "user".to_owned(),
                resource_id: user.subject.clone(),
                detail: None,
            })
            .await?;

        Ok(user)
    }

    /// Returns a principal by identifier.
    pub async fn get_user(&self, user_id: UserId) -> AppResult<User> {
        self.user_repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}
