//! In-memory session backend: process lifetime, no TTL enforcement beyond
//! opportunistic pruning of stale rate buckets.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use neuroscan_core::Session;

use crate::{SessionBackend, StoreError};

/// Rate-map size above which stale buckets are pruned.
const RATE_PRUNE_THRESHOLD: usize = 10_000;

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    rates: Mutex<HashMap<(String, u64), u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rate-counter entries (pruning diagnostics).
    pub fn rate_entries(&self) -> usize {
        self.rates.lock().map(|m| m.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionBackend for MemoryStore {
    async fn read(&self, token: &str) -> Result<Session, StoreError> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sessions.get(token).cloned().unwrap_or_default())
    }

    async fn write(
        &self,
        token: &str,
        session: &Session,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token.to_string(), session.clone());
        Ok(())
    }

    async fn incr_rate(&self, session: &str, bucket: u64) -> Result<u64, StoreError> {
        let mut rates = self.rates.lock().unwrap_or_else(|e| e.into_inner());
        if rates.len() > RATE_PRUNE_THRESHOLD {
            rates.retain(|(_, period), _| *period + 2 >= bucket);
        }
        let count = rates.entry((session.to_string(), bucket)).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroscan_core::Role;

    #[tokio::test]
    async fn missing_session_reads_as_default() {
        let store = MemoryStore::new();
        assert_eq!(store.read("nope").await.unwrap(), Session::default());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = MemoryStore::new();
        let mut session = Session::default();
        session.record_prediction("glioma_tumor", 0.82);
        session.push_turn(Role::Assistant, "Prediction: glioma_tumor");

        store
            .write("tok", &session, Duration::from_secs(60))
            .await
            .unwrap();
        let read = store.read("tok").await.unwrap();
        assert_eq!(read, session);
    }

    #[tokio::test]
    async fn rate_counter_increments_per_bucket() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_rate("s", 100).await.unwrap(), 1);
        assert_eq!(store.incr_rate("s", 100).await.unwrap(), 2);
        assert_eq!(store.incr_rate("s", 101).await.unwrap(), 1);
        assert_eq!(store.incr_rate("other", 100).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_buckets_prune_when_map_grows() {
        let store = MemoryStore::new();
        for i in 0..(RATE_PRUNE_THRESHOLD as u64 + 1) {
            store.incr_rate(&format!("s{i}"), 10).await.unwrap();
        }
        assert!(store.rate_entries() > RATE_PRUNE_THRESHOLD);
        // An increment far in the future prunes everything older than two
        // buckets.
        store.incr_rate("fresh", 1000).await.unwrap();
        assert_eq!(store.rate_entries(), 1);
    }
}
