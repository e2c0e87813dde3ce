use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use ratedesk_core::domain::session::{SessionId, SessionState};

#[derive(Clone, Debug)]
pub struct SessionEntry {
    pub state: SessionState,
    touched_at: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self { state: SessionState::default(), touched_at: Instant::now() }
    }

    pub fn touch(&mut self) {
        self.touched_at = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.touched_at.elapsed()
    }

    /// Clears every slot. The entry stays in the store so a handle held by a
    /// running turn still refers to the live session.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

/// Shared handle to one session. Holding its lock serializes turns for that
/// session without blocking any other session.
pub type SessionHandle = Arc<Mutex<SessionEntry>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session, creating an empty one on first reference.
    async fn session(&self, id: &SessionId) -> SessionHandle;

    /// Clears the session's slots once no turn holds it. Unknown ids are
    /// ignored.
    async fn reset(&self, id: &SessionId);

    /// Drops sessions idle for at least `max_idle` that no turn is using.
    /// Returns how many were removed.
    async fn purge_idle(&self, max_idle: Duration) -> usize;

    async fn len(&self) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn session(&self, id: &SessionId) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions.entry(id.clone()).or_insert_with(|| Arc::new(Mutex::new(SessionEntry::new()))),
        )
    }

    async fn reset(&self, id: &SessionId) {
        let Some(handle) = self.sessions.read().await.get(id).map(Arc::clone) else {
            return;
        };
        handle.lock().await.reset();
    }

    async fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        // A handle cloned out of the map means a turn is in flight; keep it.
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(entry) => entry.idle_for() < max_idle,
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ratedesk_core::domain::session::SessionId;

    use super::{InMemorySessionStore, SessionStore};

    #[tokio::test]
    async fn first_reference_creates_empty_session() {
        let store = InMemorySessionStore::new();
        let handle = store.session(&SessionId::from("abc")).await;

        assert!(handle.lock().await.state.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn same_id_returns_same_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::from("abc");

        store.session(&id).await.lock().await.state.country = Some("India".to_string());
        let again = store.session(&id).await;

        assert_eq!(again.lock().await.state.country.as_deref(), Some("India"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();

        store.session(&SessionId::from("a")).await.lock().await.state.country =
            Some("India".to_string());
        let other = store.session(&SessionId::from("b")).await;

        assert!(other.lock().await.state.country.is_none());
    }

    #[tokio::test]
    async fn reset_of_unknown_session_is_a_no_op() {
        let store = InMemorySessionStore::new();
        store.reset(&SessionId::from("never-seen")).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn reset_forgets_state() {
        let store = InMemorySessionStore::new();
        let id = SessionId::from("abc");
        store.session(&id).await.lock().await.state.country = Some("India".to_string());

        store.reset(&id).await;

        assert!(store.session(&id).await.lock().await.state.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn reset_waits_for_the_running_turn() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = SessionId::from("busy");
        let handle = store.session(&id).await;
        let mut turn = handle.lock().await;
        turn.state.country = Some("India".to_string());

        let reset = tokio::spawn({
            let store = Arc::clone(&store);
            let id = id.clone();
            async move { store.reset(&id).await }
        });
        tokio::task::yield_now().await;

        let again = store.session(&id).await;
        assert!(Arc::ptr_eq(&handle, &again));
        assert!(again.try_lock().is_err(), "second turn must wait for the first");
        assert!(!reset.is_finished());

        drop(turn);
        reset.await.expect("reset task");
        assert!(again.lock().await.state.is_empty());
    }

    #[tokio::test]
    async fn purge_idle_skips_sessions_in_use() {
        let store = InMemorySessionStore::new();
        let held = store.session(&SessionId::from("busy")).await;
        let _ = store.session(&SessionId::from("idle")).await;

        let removed = store.purge_idle(Duration::ZERO).await;

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(Arc::strong_count(&held), 2);
    }

    #[tokio::test]
    async fn purge_idle_keeps_recent_sessions() {
        let store = InMemorySessionStore::new();
        let _ = store.session(&SessionId::from("fresh")).await;

        assert_eq!(store.purge_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 1);
    }
}
