//! Redis-backed session store
//!
//! A session is an opaque random token handed to the browser in an HttpOnly
//! cookie; the record lives under `{prefix}session:{token}` and expires on
//! its own.

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use crate::config::settings::Settings;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::generate_random_string;

const TOKEN_LENGTH: usize = 48;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct SessionStore {
    client: Client,
    prefix: String,
    ttl_seconds: u64,
}

impl SessionStore {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            prefix: settings.redis.prefix.clone(),
            ttl_seconds: settings.redis.session_ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn key(&self, token: &str) -> String {
        format!("{}session:{}", self.prefix, token)
    }

    /// Open a session for `user_id` and return its token
    pub async fn create(&self, user_id: Uuid) -> Result<String> {
        let token = generate_random_string(TOKEN_LENGTH);
        let session = Session {
            user_id,
            created_at: Utc::now(),
        };
        let serialized = serde_json::to_string(&session)?;

        let mut conn = self.get_connection().await?;
        let _: () = conn.set_ex(self.key(&token), serialized, self.ttl_seconds).await?;

        debug!(user_id = %user_id, ttl = self.ttl_seconds, "Session created");
        Ok(token)
    }

    /// Look a session up; expired and unknown tokens both yield `None`
    pub async fn get(&self, token: &str) -> Result<Option<Session>> {
        if token.is_empty() || token.len() > TOKEN_LENGTH * 2 {
            return Ok(None);
        }

        let mut conn = self.get_connection().await?;
        let raw: Option<String> = conn.get(self.key(token)).await?;

        match raw {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    /// Drop a session; returns whether it existed
    pub async fn destroy(&self, token: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let deleted: i64 = conn.del(self.key(token)).await?;
        Ok(deleted > 0)
    }

    /// Check Redis health
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(EventHubError::Internal(format!("unexpected PING reply: {pong}")))
        }
    }
}
