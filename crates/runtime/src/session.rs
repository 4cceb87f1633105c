//! In-memory session table.
//!
//! Each session holds its state behind a per-session async mutex: turns
//! within one session are strictly serialized, while sessions run freely in
//! parallel. The turn orchestrator clones under the lock, mutates the
//! clone, and swaps it back — readers elsewhere only ever see value copies.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use uuid::Uuid;

use world_core::GameState;

type SessionSlot = Arc<Mutex<GameState>>;

/// Session table keyed by session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn fresh_state() -> GameState {
        // Seed stays zero until the first world prompt fixes it.
        GameState::new(0)
    }

    /// Resolves a session id, creating the session when the id is unknown
    /// or absent. Returns the resolved id and the state slot.
    pub fn resolve(&self, id: Option<&str>) -> (String, SessionSlot) {
        let id = id
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(slot) = self.sessions.read().ok().and_then(|map| map.get(&id).cloned()) {
            return (id, slot);
        }

        let slot: SessionSlot = Arc::new(Mutex::new(Self::fresh_state()));
        if let Ok(mut map) = self.sessions.write() {
            // Another writer may have raced us; keep whichever landed first.
            let entry = map.entry(id.clone()).or_insert_with(|| slot.clone());
            return (id, entry.clone());
        }
        (id, slot)
    }

    /// Replaces a session's state wholesale (reset, load).
    pub async fn replace(&self, id: &str, state: GameState) -> SessionSlot {
        let (_, slot) = self.resolve(Some(id));
        *slot.lock().await = state;
        slot
    }

    /// Value copy of a session's current state.
    pub async fn snapshot(&self, id: &str) -> Option<GameState> {
        let slot = self
            .sessions
            .read()
            .ok()
            .and_then(|map| map.get(id).cloned())?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    pub fn count(&self) -> usize {
        self.sessions.read().map(|map| map.len()).unwrap_or(0)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_creates_once_and_reuses() {
        let store = SessionStore::new();
        let (id, slot_a) = store.resolve(None);
        let (id_b, slot_b) = store.resolve(Some(&id));
        assert_eq!(id, id_b);
        assert!(Arc::ptr_eq(&slot_a, &slot_b));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn replace_swaps_state_atomically() {
        let store = SessionStore::new();
        let (id, _) = store.resolve(None);
        let mut state = GameState::new(9);
        state.turn_counter = 5;
        store.replace(&id, state).await;
        assert_eq!(store.snapshot(&id).await.unwrap().turn_counter, 5);
    }

    #[tokio::test]
    async fn snapshots_are_value_copies() {
        let store = SessionStore::new();
        let (id, slot) = store.resolve(None);
        let mut copy = store.snapshot(&id).await.unwrap();
        copy.turn_counter = 99;
        assert_eq!(slot.lock().await.turn_counter, 0);
    }
}
