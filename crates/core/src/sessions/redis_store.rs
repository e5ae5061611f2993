use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::constants::REDIS_SESSION_KEY_PREFIX;
use crate::errors::{Error, Result};
use crate::sessions::sessions_model::Session;
use crate::sessions::sessions_traits::SessionStoreTrait;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Session store shared by every replica. Entries are written with `SETEX`,
/// so Redis drops them itself once the session expires.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connects and pings the server; fails when Redis is unreachable.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, client.get_connection_manager())
            .await
            .map_err(|_| Error::Session(format!("Timed out connecting to Redis at {url}")))??;

        let mut store = Self { conn };
        let _: String = redis::cmd("PING").query_async(&mut store.conn).await?;
        info!("Redis connected for sessions");
        Ok(store)
    }

    fn key(token: &str) -> String {
        format!("{REDIS_SESSION_KEY_PREFIX}{token}")
    }
}

#[async_trait]
impl SessionStoreTrait for RedisSessionStore {
    async fn put(&self, session: Session) -> Result<()> {
        let ttl = (session.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let value = serde_json::to_string(&session)
            .map_err(|e| Error::Session(format!("Failed to encode session: {e}")))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(Self::key(&session.token), value, ttl).await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(token)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                debug!("Discarding unreadable session entry: {}", e);
                Ok(None)
            }
        }
    }

    async fn remove(&self, token: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.del(Self::key(token)).await?;
        Ok(removed > 0)
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
        // Keys carry their own TTL.
        Ok(0)
    }
}
