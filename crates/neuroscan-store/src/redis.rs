//! Redis session backend with native TTL support.
//!
//! Sessions are stored as JSON strings under `session:{token}` with a
//! per-write TTL. Rate counters use atomic `INCR` under
//! `llm_rl:{session}:{bucket}`, expiring shortly after the bucket closes.

use std::time::Duration;

use async_trait::async_trait;
use ::redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::info;

use neuroscan_core::Session;

use crate::{SessionBackend, StoreError};

const SESSION_PREFIX: &str = "session:";
const RATE_PREFIX: &str = "llm_rl:";
/// Rate keys outlive their one-minute bucket by a small margin.
const RATE_KEY_TTL_SECS: i64 = 70;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(url, "connected to redis session backend");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionBackend for RedisStore {
    async fn read(&self, token: &str) -> Result<Session, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(format!("{SESSION_PREFIX}{token}")).await?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Session::default()),
        }
    }

    async fn write(
        &self,
        token: &str,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(session)?;
        let () = conn
            .set_ex(format!("{SESSION_PREFIX}{token}"), raw, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn incr_rate(&self, session: &str, bucket: u64) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let key = format!("{RATE_PREFIX}{session}:{bucket}");
        let count: u64 = conn.incr(&key, 1u64).await?;
        if count == 1 {
            let () = conn.expire(&key, RATE_KEY_TTL_SECS).await?;
        }
        Ok(count)
    }
}
