use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::UserId;

use crate::access_ports::{
    AssignRoleInput, BatchAction, BatchFailure, BatchPair, BatchRoleInput, BatchRoleOutcome,
};

use super::AccessAdminService;

impl AccessAdminService {
    /// Applies an assign or revoke operation across `user_ids × role_ids`.
    ///
    /// Pairs run sequentially in input order, each inside its own failure
    /// boundary: a pair's error is captured in `failed` and never aborts the
    /// remaining pairs. No transaction wraps the batch; partial application
    /// is a reported outcome. The call itself fails only for
    /// orchestration-level problems such as empty input lists.
    pub async fn batch_assign_roles(
        &self,
        actor: UserId,
        input: BatchRoleInput,
    ) -> AppResult<BatchRoleOutcome> {
        if input.user_ids.is_empty() {
            return Err(AppError::Validation(
                "batch user id list must not be empty".to_owned(),
            ));
        }

        if input.role_ids.is_empty() {
            return Err(AppError::Validation(
                "batch role id list must not be empty".to_owned(),
            ));
        }

        let mut outcome = BatchRoleOutcome::default();

        for &user_id in &input.user_ids {
            for &role_id in &input.role_ids {
                let result = match input.action {
                    BatchAction::Assign => self
                        .assign_role(
                            actor,
                            AssignRoleInput {
                                user_id,
                                role_id,
                                reason: input.reason.clone(),
                            },
                        )
                        .await
                        .map(|_| ()),
                    BatchAction::Revoke => self.revoke_role(actor, user_id, role_id).await,
                };

                match result {
                    Ok(()) => outcome.succeeded.push(BatchPair { user_id, role_id }),
                    Err(error) => outcome.failed.push(BatchFailure {
                        user_id,
                        role_id,
                        error: error.to_string(),
                    }),
                }
            }
        }

        Ok(outcome)
    }
}
