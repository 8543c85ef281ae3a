//! In-process backend

use super::{PlayerRegistry, RoundLog, SessionStore, STATUS_STARTED};
use crate::error::{StoreError, StoreResult};
use crate::types::{RoundRecord, StoredSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    sessions: Mutex<HashMap<String, StoredSession>>,
    players: Mutex<HashMap<String, (DateTime<Utc>, String)>>,
    rounds: Mutex<Vec<RoundRecord>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_sessions: AtomicBool,
    fail_registry: AtomicBool,
}

/// Session store, registry and round log held in memory.
///
/// Clones share state. Backends can be switched off with
/// [`MemoryStore::set_sessions_available`] / [`MemoryStore::set_registry_available`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored session directly
    pub fn insert(&self, player_id: &str, session: StoredSession) {
        self.inner
            .sessions
            .lock()
            .insert(player_id.to_string(), session);
    }

    pub fn get(&self, player_id: &str) -> Option<StoredSession> {
        self.inner.sessions.lock().get(player_id).cloned()
    }

    pub fn player_status(&self, player_id: &str) -> Option<String> {
        self.inner
            .players
            .lock()
            .get(player_id)
            .map(|(_, status)| status.clone())
    }

    pub fn player_count(&self) -> usize {
        self.inner.players.lock().len()
    }

    pub fn rounds_for(&self, player_id: &str) -> Vec<RoundRecord> {
        self.inner
            .rounds
            .lock()
            .iter()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect()
    }

    pub fn load_count(&self) -> usize {
        self.inner.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    pub fn set_sessions_available(&self, available: bool) {
        self.inner.fail_sessions.store(!available, Ordering::SeqCst);
    }

    pub fn set_registry_available(&self, available: bool) {
        self.inner.fail_registry.store(!available, Ordering::SeqCst);
    }

    fn check_sessions(&self) -> StoreResult<()> {
        if self.inner.fail_sessions.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("session store offline".to_string()));
        }
        Ok(())
    }

    fn check_registry(&self) -> StoreResult<()> {
        if self.inner.fail_registry.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("registry offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, player_id: &str) -> StoreResult<Option<StoredSession>> {
        self.inner.loads.fetch_add(1, Ordering::SeqCst);
        self.check_sessions()?;
        Ok(self.get(player_id))
    }

    async fn save(&self, player_id: &str, session: &StoredSession) -> StoreResult<()> {
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        self.check_sessions()?;
        self.insert(player_id, session.clone());
        Ok(())
    }
}

#[async_trait]
impl PlayerRegistry for MemoryStore {
    async fn register(&self, player_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.check_registry()?;
        self.inner
            .players
            .lock()
            .entry(player_id.to_string())
            .or_insert_with(|| (at, STATUS_STARTED.to_string()));
        Ok(())
    }

    async fn mark_finished(&self, player_id: &str, status: &str) -> StoreResult<()> {
        self.check_registry()?;
        if let Some(entry) = self.inner.players.lock().get_mut(player_id) {
            entry.1 = status.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl RoundLog for MemoryStore {
    async fn record_round(&self, record: &RoundRecord) -> StoreResult<()> {
        self.check_sessions()?;
        self.inner.rounds.lock().push(record.clone());
        Ok(())
    }
}
