//! Remote notification service contract.

pub mod http;

use async_trait::async_trait;

use crate::errors::NotifyError;
use crate::models::notification::Notification;

/// The two calls the store depends on. Both authenticate with the session's
/// bearer token; callers never invoke them without one.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Full notification collection for the session, newest first.
    async fn list(&self, token: &str) -> Result<Vec<Notification>, NotifyError>;

    /// Mark one notification read. Idempotent on the service side.
    async fn mark_read(&self, token: &str, id: &str) -> Result<(), NotifyError>;
}
