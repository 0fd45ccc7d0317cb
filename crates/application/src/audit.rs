//! Audit event port shared by application services.

use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::{AuditAction, UserId};

/// Append-only audit event emitted by application use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Principal that performed the operation.
    pub actor: UserId,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Event resource type.
    pub resource_type: String,
    /// Event resource identifier.
    pub resource_id: String,
    /// Optional event detail.
    pub detail: Option<String>,
}

/// Repository port for appending audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit log.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
