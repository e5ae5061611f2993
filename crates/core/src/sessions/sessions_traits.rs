use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::sessions::sessions_model::Session;

/// Storage seam for login sessions. Implementations must be safe to share
/// across request handlers.
#[async_trait]
pub trait SessionStoreTrait: Send + Sync {
    async fn put(&self, session: Session) -> Result<()>;
    async fn get(&self, token: &str) -> Result<Option<Session>>;
    async fn remove(&self, token: &str) -> Result<bool>;
    /// Removes every session that has expired at `now`, returning how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Trait for session service operations
#[async_trait]
pub trait SessionServiceTrait: Send + Sync {
    async fn create_session(&self, email: &str) -> Result<Session>;
    /// Resolves a token to the owning email, or `None` if unknown or expired.
    async fn verify_session(&self, token: &str) -> Result<Option<String>>;
    async fn revoke_session(&self, token: &str) -> Result<()>;
    async fn purge_expired(&self) -> Result<usize>;
    fn ttl_secs(&self) -> i64;
}
