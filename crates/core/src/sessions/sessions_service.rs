use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use rand::{rngs::OsRng, RngCore};

use crate::constants::SESSION_TOKEN_BYTES;
use crate::errors::{Error, Result};
use crate::sessions::sessions_model::Session;
use crate::sessions::sessions_traits::{SessionServiceTrait, SessionStoreTrait};

pub struct SessionService {
    store: Arc<dyn SessionStoreTrait>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStoreTrait>, ttl_secs: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[async_trait]
impl SessionServiceTrait for SessionService {
    async fn create_session(&self, email: &str) -> Result<Session> {
        if email.trim().is_empty() {
            return Err(Error::Session("Cannot create a session without an email".into()));
        }
        let now = Utc::now();
        let session = Session {
            token: Self::generate_token(),
            email: email.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.store.put(session.clone()).await?;
        Ok(session)
    }

    async fn verify_session(&self, token: &str) -> Result<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }
        let Some(session) = self.store.get(token).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            debug!("Dropping expired session for {}", session.email);
            self.store.remove(token).await?;
            return Ok(None);
        }
        Ok(Some(session.email))
    }

    async fn revoke_session(&self, token: &str) -> Result<()> {
        self.store.remove(token).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(Utc::now()).await
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}
