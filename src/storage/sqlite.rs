//! SQLite backend
//!
//! Money columns are TEXT so a resumed balance is exactly the one saved.

use super::{PlayerRegistry, RoundLog, SessionStore, STATUS_STARTED};
use crate::error::{StoreError, StoreResult};
use crate::types::{RoundRecord, Side, StoredSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sessions (
        email TEXT PRIMARY KEY,
        balance TEXT NOT NULL,
        rounds_played INTEGER NOT NULL,
        game_over INTEGER NOT NULL DEFAULT 0,
        last_updated TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS players (
        email TEXT PRIMARY KEY,
        registered_at TEXT NOT NULL,
        status TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS rounds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        email TEXT NOT NULL,
        round INTEGER NOT NULL,
        wager TEXT NOT NULL,
        predicted TEXT NOT NULL,
        outcome TEXT NOT NULL,
        balance_before TEXT NOT NULL,
        balance_after TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_rounds_email ON rounds (email)",
];

/// SQLite-backed session store, player registry and round log
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `path`; `:memory:` gives a private in-memory db
    pub async fn connect(path: &str) -> StoreResult<Self> {
        let pool = if path == ":memory:" {
            // every connection to sqlite::memory: is its own database, keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        debug!("Connected to session database at {}", path);
        Ok(db)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Registry status text for a player, if registered
    pub async fn player_status(&self, player_id: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT status FROM players WHERE email = ?")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => Some(row.try_get("status")?),
            None => None,
        })
    }

    /// Logged rounds for a player, oldest first
    pub async fn rounds_for(&self, player_id: &str) -> StoreResult<Vec<RoundRecord>> {
        let rows = sqlx::query(
            "SELECT session_id, email, round, wager, predicted, outcome,
                    balance_before, balance_after, timestamp
             FROM rounds WHERE email = ? ORDER BY id",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| parse_round(player_id, row)).collect()
    }
}

fn parse_decimal(player_id: &str, column: &str, raw: &str) -> StoreResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| StoreError::Corrupt {
        player_id: player_id.to_string(),
        detail: format!("{} {:?}: {}", column, raw, e),
    })
}

fn parse_side(player_id: &str, raw: &str) -> StoreResult<Side> {
    Side::from_str(raw).map_err(|detail| StoreError::Corrupt {
        player_id: player_id.to_string(),
        detail,
    })
}

fn parse_rounds(player_id: &str, raw: i64) -> StoreResult<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt {
        player_id: player_id.to_string(),
        detail: format!("round count {}", raw),
    })
}

fn parse_round(player_id: &str, row: &SqliteRow) -> StoreResult<RoundRecord> {
    let wager: String = row.try_get("wager")?;
    let predicted: String = row.try_get("predicted")?;
    let outcome: String = row.try_get("outcome")?;
    let before: String = row.try_get("balance_before")?;
    let after: String = row.try_get("balance_after")?;

    Ok(RoundRecord {
        session_id: row.try_get("session_id")?,
        player_id: row.try_get("email")?,
        round: parse_rounds(player_id, row.try_get("round")?)?,
        wager: parse_decimal(player_id, "wager", &wager)?,
        predicted: parse_side(player_id, &predicted)?,
        outcome: parse_side(player_id, &outcome)?,
        balance_before: parse_decimal(player_id, "balance_before", &before)?,
        balance_after: parse_decimal(player_id, "balance_after", &after)?,
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl SessionStore for Database {
    async fn load(&self, player_id: &str) -> StoreResult<Option<StoredSession>> {
        let row = sqlx::query(
            "SELECT balance, rounds_played, game_over FROM sessions WHERE email = ?",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let balance: String = row.try_get("balance")?;
        Ok(Some(StoredSession {
            balance: parse_decimal(player_id, "balance", &balance)?,
            rounds_played: parse_rounds(player_id, row.try_get("rounds_played")?)?,
            is_over: row.try_get("game_over")?,
        }))
    }

    async fn save(&self, player_id: &str, session: &StoredSession) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (email, balance, rounds_played, game_over, last_updated)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                balance = excluded.balance,
                rounds_played = excluded.rounds_played,
                game_over = excluded.game_over,
                last_updated = excluded.last_updated",
        )
        .bind(player_id)
        .bind(session.balance.to_string())
        .bind(i64::from(session.rounds_played))
        .bind(session.is_over)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerRegistry for Database {
    async fn register(&self, player_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO players (email, registered_at, status) VALUES (?, ?, ?)")
            .bind(player_id)
            .bind(at)
            .bind(STATUS_STARTED)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_finished(&self, player_id: &str, status: &str) -> StoreResult<()> {
        sqlx::query("UPDATE players SET status = ? WHERE email = ?")
            .bind(status)
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RoundLog for Database {
    async fn record_round(&self, record: &RoundRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO rounds (session_id, email, round, wager, predicted, outcome,
                                 balance_before, balance_after, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.session_id)
        .bind(&record.player_id)
        .bind(i64::from(record.round))
        .bind(record.wager.to_string())
        .bind(record.predicted.to_string())
        .bind(record.outcome.to_string())
        .bind(record.balance_before.to_string())
        .bind(record.balance_after.to_string())
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn stored(balance: Decimal, rounds_played: u32, is_over: bool) -> StoredSession {
        StoredSession {
            balance,
            rounds_played,
            is_over,
        }
    }

    #[tokio::test]
    async fn test_load_unknown_player() {
        let db = Database::connect(":memory:").await.unwrap();
        assert_eq!(db.load("nobody@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load_exact_balance() {
        let db = Database::connect(":memory:").await.unwrap();
        db.save("a@x.com", &stored(dec!(30.10), 3, false)).await.unwrap();

        let loaded = db.load("a@x.com").await.unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(30.10));
        assert_eq!(loaded.balance.to_string(), "30.10");
        assert_eq!(loaded.rounds_played, 3);
        assert!(!loaded.is_over);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let db = Database::connect(":memory:").await.unwrap();
        db.save("a@x.com", &stored(dec!(25.00), 0, false)).await.unwrap();
        db.save("a@x.com", &stored(dec!(0.00), 100, true)).await.unwrap();

        let loaded = db.load("a@x.com").await.unwrap().unwrap();
        assert_eq!(loaded, stored(dec!(0.00), 100, true));
    }

    #[tokio::test]
    async fn test_persists_across_reconnect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coinflip.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::connect(path).await.unwrap();
            db.save("a@x.com", &stored(dec!(12.34), 7, false)).await.unwrap();
        }

        let db = Database::connect(path).await.unwrap();
        let loaded = db.load("a@x.com").await.unwrap().unwrap();
        assert_eq!(loaded, stored(dec!(12.34), 7, false));
    }

    #[tokio::test]
    async fn test_register_is_idempotent_and_mark_finished() {
        let db = Database::connect(":memory:").await.unwrap();
        db.register("a@x.com", Utc::now()).await.unwrap();
        db.register("a@x.com", Utc::now()).await.unwrap();
        assert_eq!(db.player_status("a@x.com").await.unwrap().as_deref(), Some("Started"));

        db.mark_finished("a@x.com", "Finished - $30.00").await.unwrap();
        assert_eq!(
            db.player_status("a@x.com").await.unwrap().as_deref(),
            Some("Finished - $30.00")
        );
        assert_eq!(db.player_status("b@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_round_log() {
        let db = Database::connect(":memory:").await.unwrap();
        for round in 1..=2 {
            db.record_round(&RoundRecord {
                session_id: "s1".to_string(),
                player_id: "a@x.com".to_string(),
                round,
                wager: dec!(5.00),
                predicted: Side::Heads,
                outcome: Side::Tails,
                balance_before: dec!(25.00),
                balance_after: dec!(20.00),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();
        }

        let rounds = db.rounds_for("a@x.com").await.unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].round, 1);
        assert_eq!(rounds[1].round, 2);
        assert_eq!(rounds[0].outcome, Side::Tails);
        assert_eq!(rounds[0].balance_after, dec!(20.00));
        assert!(db.rounds_for("b@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_balance_is_reported() {
        let db = Database::connect(":memory:").await.unwrap();
        sqlx::query(
            "INSERT INTO sessions (email, balance, rounds_played, game_over, last_updated)
             VALUES ('a@x.com', 'lots', 1, 0, '2024-01-01T00:00:00Z')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        let err = db.load("a@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
