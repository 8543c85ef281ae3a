//! Append-only player registry in a JSON lines file
//!
//! One line per event; the latest line for a player carries its status.

use super::{PlayerRegistry, STATUS_STARTED};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistryEvent {
    Registered,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub timestamp: DateTime<Utc>,
    pub player_id: String,
    pub event: RegistryEvent,
    pub status: String,
}

pub struct JsonlRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order; a missing file is an empty registry
    pub async fn entries(&self) -> StoreResult<Vec<RegistryEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<RegistryEntry>(line).map_err(StoreError::from))
            .collect()
    }

    /// Latest status recorded for a player
    pub async fn status_of(&self, player_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .rev()
            .find(|e| e.player_id == player_id)
            .map(|e| e.status))
    }

    async fn append(&self, entry: &RegistryEntry) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerRegistry for JsonlRegistry {
    async fn register(&self, player_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let known = self
            .entries()
            .await?
            .iter()
            .any(|e| e.player_id == player_id && e.event == RegistryEvent::Registered);
        if known {
            debug!("{} already in registry", player_id);
            return Ok(());
        }

        self.append(&RegistryEntry {
            timestamp: at,
            player_id: player_id.to_string(),
            event: RegistryEvent::Registered,
            status: STATUS_STARTED.to_string(),
        })
        .await
    }

    async fn mark_finished(&self, player_id: &str, status: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.append(&RegistryEntry {
            timestamp: Utc::now(),
            player_id: player_id.to_string(),
            event: RegistryEvent::Finished,
            status: status.to_string(),
        })
        .await
    }
}
