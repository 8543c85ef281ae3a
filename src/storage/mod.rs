//! Persistence capabilities
//!
//! The ledger talks to three small traits instead of a concrete backend:
//! - [`SessionStore`]: durable `player_id -> {balance, rounds, over}` mapping
//! - [`PlayerRegistry`]: append-only registration and final-status log
//! - [`RoundLog`]: audit trail of resolved wagers
//!
//! [`Database`] implements all three on SQLite. [`MemoryStore`] does the same
//! in process, and [`JsonlRegistry`] keeps the registry in a JSON lines file.

mod jsonl;
mod memory;
mod sqlite;

pub use jsonl::{JsonlRegistry, RegistryEntry, RegistryEvent};
pub use memory::MemoryStore;
pub use sqlite::Database;

use crate::error::StoreResult;
use crate::types::{RoundRecord, StoredSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Registry status written at registration
pub const STATUS_STARTED: &str = "Started";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, player_id: &str) -> StoreResult<Option<StoredSession>>;

    /// Upsert: create the record if absent, otherwise overwrite it fully
    async fn save(&self, player_id: &str, session: &StoredSession) -> StoreResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerRegistry: Send + Sync {
    /// Record a first visit. Registering a known player is a no-op.
    async fn register(&self, player_id: &str, at: DateTime<Utc>) -> StoreResult<()>;

    async fn mark_finished(&self, player_id: &str, status: &str) -> StoreResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoundLog: Send + Sync {
    async fn record_round(&self, record: &RoundRecord) -> StoreResult<()>;
}
