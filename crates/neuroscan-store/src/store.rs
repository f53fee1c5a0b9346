//! Session store facade.
//!
//! Owns a backend and converts its failures into safe defaults: reads fall
//! back to an empty session, writes are best-effort, and rate increments fall
//! back to an in-memory counter. External-store failures are logged, never
//! surfaced to callers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;
use uuid::Uuid;

use neuroscan_core::Session;

use crate::{MemoryStore, SessionBackend};

/// Session lifetime on the durable backend.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct SessionStore {
    backend: Box<dyn SessionBackend>,
    /// Used when the durable backend fails to increment a rate counter.
    fallback_rates: Mutex<HashMap<(String, u64), u64>>,
    session_ttl: Duration,
}

impl SessionStore {
    pub fn new(backend: Box<dyn SessionBackend>) -> Self {
        Self {
            backend,
            fallback_rates: Mutex::new(HashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Store backed by the process-local map only.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Return the caller's existing token, or mint a new one and initialize
    /// an empty session for it. Idempotent for existing tokens: the stored
    /// session is not touched.
    pub async fn get_or_create(&self, token: Option<&str>) -> String {
        if let Some(token) = token {
            return token.to_string();
        }
        let token = Uuid::new_v4().to_string();
        if let Err(err) = self
            .backend
            .write(&token, &Session::default(), self.session_ttl)
            .await
        {
            warn!(%err, "failed to initialize session, continuing");
        }
        token
    }

    /// Read the session for a token; backend failures degrade to an empty
    /// session.
    pub async fn read(&self, token: &str) -> Session {
        match self.backend.read(token).await {
            Ok(session) => session,
            Err(err) => {
                warn!(%err, token, "session read failed, returning empty session");
                Session::default()
            }
        }
    }

    /// Persist the session for a token, best-effort.
    pub async fn write(&self, token: &str, session: &Session) {
        if let Err(err) = self.backend.write(token, session, self.session_ttl).await {
            warn!(%err, token, "session write failed");
        }
    }

    /// True when the session is still under `limit` calls for the current
    /// one-minute bucket. Always increments.
    pub async fn check_and_increment(&self, session: &str, limit: u64) -> bool {
        self.check_and_increment_at(session, current_bucket(), limit)
            .await
    }

    async fn check_and_increment_at(&self, session: &str, bucket: u64, limit: u64) -> bool {
        let count = match self.backend.incr_rate(session, bucket).await {
            Ok(count) => count,
            Err(err) => {
                warn!(%err, "rate backend failed, using in-memory fallback");
                let mut rates = self.fallback_rates.lock().unwrap_or_else(|e| e.into_inner());
                let count = rates.entry((session.to_string(), bucket)).or_insert(0);
                *count += 1;
                *count
            }
        };
        count <= limit
    }
}

fn current_bucket() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() / 60)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neuroscan_core::Role;

    use crate::StoreError;

    #[tokio::test]
    async fn get_or_create_returns_existing_token_untouched() {
        let store = SessionStore::in_memory();
        let token = store.get_or_create(None).await;

        let mut session = store.read(&token).await;
        session.push_turn(Role::User, "hello");
        store.write(&token, &session).await;

        // A second call with the same token must not reset history.
        let again = store.get_or_create(Some(&token)).await;
        assert_eq!(again, token);
        assert_eq!(store.read(&token).await.history.len(), 1);
    }

    #[tokio::test]
    async fn minted_tokens_are_unique() {
        let store = SessionStore::in_memory();
        let a = store.get_or_create(None).await;
        let b = store.get_or_create(None).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn round_trip_preserves_session_fields() {
        let store = SessionStore::in_memory();
        let token = store.get_or_create(None).await;

        let mut session = Session::default();
        session.record_prediction("pituitary_tumor", 0.77);
        session.push_turn(Role::User, "what now?");
        session.push_turn(Role::Assistant, "see a specialist");
        store.write(&token, &session).await;

        let read = store.read(&token).await;
        assert_eq!(read.last_prediction.as_deref(), Some("pituitary_tumor"));
        assert_eq!(read.last_confidence, Some(0.77));
        assert_eq!(read.history, session.history);
    }

    #[tokio::test]
    async fn rate_limit_allows_exactly_limit_calls_per_bucket() {
        let store = SessionStore::in_memory();
        let limit = 6;
        for _ in 0..limit {
            assert!(store.check_and_increment_at("sid", 500, limit).await);
        }
        assert!(!store.check_and_increment_at("sid", 500, limit).await);
        // Next bucket starts fresh.
        assert!(store.check_and_increment_at("sid", 501, limit).await);
    }

    #[tokio::test]
    async fn rate_limit_is_per_session() {
        let store = SessionStore::in_memory();
        assert!(!store.check_and_increment_at("a", 7, 0).await);
        assert!(store.check_and_increment_at("b", 7, 1).await);
    }

    /// Backend that fails every operation, for fallback coverage.
    struct Broken;

    fn broken_error() -> StoreError {
        StoreError::Serde(serde_json::from_str::<Session>("not json").unwrap_err())
    }

    #[async_trait]
    impl SessionBackend for Broken {
        async fn read(&self, _token: &str) -> Result<Session, StoreError> {
            Err(broken_error())
        }

        async fn write(
            &self,
            _token: &str,
            _session: &Session,
            _ttl: Duration,
        ) -> Result<(), StoreError> {
            Err(broken_error())
        }

        async fn incr_rate(&self, _session: &str, _bucket: u64) -> Result<u64, StoreError> {
            Err(broken_error())
        }
    }

    #[tokio::test]
    async fn broken_backend_degrades_to_defaults() {
        let store = SessionStore::new(Box::new(Broken));
        assert_eq!(store.read("tok").await, Session::default());
        // Rate limiting still enforced through the in-memory fallback.
        assert!(store.check_and_increment_at("tok", 9, 1).await);
        assert!(!store.check_and_increment_at("tok", 9, 1).await);
    }
}
