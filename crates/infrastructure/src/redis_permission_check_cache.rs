//! Redis-backed permission-check cache.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use gatewarden_application::PermissionCheckCache;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{PermissionName, UserId};

/// Redis implementation of the permission-check cache port.
///
/// Checks for one user live in a hash keyed by the user id and the current
/// epoch counter. Whole-cache invalidation bumps the epoch, which orphans
/// every old hash; the per-entry ttl cleans those up.
#[derive(Clone)]
pub struct RedisPermissionCheckCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPermissionCheckCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    fn epoch_key(&self) -> String {
        format!("{}:epoch", self.key_prefix)
    }

    async fn current_epoch(&self, connection: &mut MultiplexedConnection) -> AppResult<u64> {
        let epoch: Option<u64> = connection.get(self.epoch_key()).await.map_err(|error| {
            AppError::Internal(format!("failed to read permission cache epoch: {error}"))
        })?;

        Ok(epoch.unwrap_or(0))
    }

    fn user_key(&self, epoch: u64, user_id: UserId) -> String {
        format!("{}:epoch={epoch}:user={user_id}", self.key_prefix)
    }
}

#[async_trait]
impl PermissionCheckCache for RedisPermissionCheckCache {
    async fn get_check(
        &self,
        user_id: UserId,
        permission: &PermissionName,
    ) -> AppResult<Option<bool>> {
        let mut connection = self.connection().await?;
        let epoch = self.current_epoch(&mut connection).await?;

        let encoded: Option<String> = connection
            .hget(self.user_key(epoch, user_id), permission.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read permission cache entry: {error}"
                ))
            })?;

        match encoded.as_deref() {
            None => Ok(None),
            Some("1") => Ok(Some(true)),
            Some("0") => Ok(Some(false)),
            Some(other) => Err(AppError::Internal(format!(
                "invalid permission cache value '{other}'"
            ))),
        }
    }

    async fn set_check(
        &self,
        user_id: UserId,
        permission: &PermissionName,
        allowed: bool,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;
        let epoch = self.current_epoch(&mut connection).await?;
        let key = self.user_key(epoch, user_id);

        let _: i64 = connection
            .hset(key.as_str(), permission.as_str(), if allowed { "1" } else { "0" })
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write permission cache entry: {error}"
                ))
            })?;

        let _: bool = connection
            .expire(key.as_str(), i64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to set permission cache ttl: {error}"
                ))
            })?;

        Ok(())
    }

    async fn invalidate_user(&self, user_id: UserId) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let epoch = self.current_epoch(&mut connection).await?;

        let _: i64 = connection
            .del(self.user_key(epoch, user_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to drop permission cache entries: {error}"
                ))
            })?;

        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;

        let _: u64 = connection.incr(self.epoch_key(), 1u64).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to advance permission cache epoch: {error}"
            ))
        })?;

        Ok(())
    }
}
