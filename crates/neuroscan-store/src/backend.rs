//! Backend contract shared by the in-memory and Redis stores.
//!
//! The two backends must be behaviorally indistinguishable to callers except
//! for durability and cross-process visibility. Session access is plain
//! read-modify-write; rate counters are the only operation that must be
//! atomic on a durable backend.

use std::time::Duration;

use async_trait::async_trait;

use neuroscan_core::Session;

use crate::StoreError;

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Fetch the session for a token, or an empty default when missing.
    async fn read(&self, token: &str) -> Result<Session, StoreError>;

    /// Upsert the session for a token. `ttl` applies only to durable
    /// backends.
    async fn write(&self, token: &str, session: &Session, ttl: Duration)
    -> Result<(), StoreError>;

    /// Increment the rate counter for `(session, bucket)` and return the
    /// post-increment count. Bucket values are one-minute wall-clock periods.
    async fn incr_rate(&self, session: &str, bucket: u64) -> Result<u64, StoreError>;
}
