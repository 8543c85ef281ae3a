//! Session ledger
//!
//! Owns the balance and round-count rules of a game:
//! - `start_session` resumes a stored session or registers a new player
//! - `place_wager` resolves one flip and persists the result
//! - `flush` retries the save of a session whose last round was not persisted
//!
//! The ledger holds no per-player state. Callers own the [`PlayerSession`]
//! and must not run two wagers for the same player at once.


use crate::coin::{CoinFlipper, RandomCoin};
use crate::config::GameConfig;
use crate::error::{GameError, Result, StoreError, StoreResult};
use crate::report::final_status;
use crate::storage::{PlayerRegistry, RoundLog, SessionStore};
use crate::types::{PlayerSession, RoundRecord, Side, StoredSession, WagerOutcome};
use chrono::Utc;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Ledger {
    store: Arc<dyn SessionStore>,
    registry: Arc<dyn PlayerRegistry>,
    round_log: Option<Arc<dyn RoundLog>>,
    coin: Arc<dyn CoinFlipper>,
    rules: GameConfig,
    store_timeout: Duration,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn PlayerRegistry>,
        rules: GameConfig,
    ) -> Self {
        let coin = Arc::new(RandomCoin::new(rules.heads_probability));
        Self {
            store,
            registry,
            round_log: None,
            coin,
            rules,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Replace the coin (forced outcomes in tests, seeded coins in simulations)
    pub fn with_coin(mut self, coin: Arc<dyn CoinFlipper>) -> Self {
        self.coin = coin;
        self
    }

    pub fn with_round_log(mut self, round_log: Arc<dyn RoundLog>) -> Self {
        self.round_log = Some(round_log);
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn rules(&self) -> &GameConfig {
        &self.rules
    }

    /// Session is over once the balance drops below the minimum or the round cap is reached
    pub fn is_terminal(&self, balance: Decimal, rounds_played: u32) -> bool {
        balance < self.rules.min_balance || rounds_played >= self.rules.max_rounds
    }

    /// Resume the stored session for `player_id`, or register the player and start fresh
    pub async fn start_session(&self, player_id: &str) -> Result<PlayerSession> {
        let player_id = player_id.trim();
        if player_id.is_empty() {
            return Err(GameError::InvalidPlayer("player id must not be empty".to_string()));
        }

        let stored = self
            .bounded(self.store.load(player_id))
            .await
            .map_err(|e| unavailable("load", e))?;

        let session = match stored {
            Some(stored) => self.resume(player_id, stored),
            None => self.register(player_id).await?,
        };

        Ok(session)
    }

    fn resume(&self, player_id: &str, stored: StoredSession) -> PlayerSession {
        let is_over = self.is_terminal(stored.balance, stored.rounds_played);
        if is_over != stored.is_over {
            warn!(
                "Stored game-over flag for {} is {} but balance {} after {} rounds says {}",
                player_id, stored.is_over, stored.balance, stored.rounds_played, is_over
            );
        }

        info!(
            "Resuming session for {}: balance {}, {} rounds played{}",
            player_id,
            stored.balance,
            stored.rounds_played,
            if is_over { " (over)" } else { "" }
        );

        PlayerSession {
            player_id: player_id.to_string(),
            session_id: new_session_id(),
            balance: stored.balance,
            rounds_played: stored.rounds_played,
            is_over,
            balance_history: vec![stored.balance],
            dirty: false,
            max_rounds: self.rules.max_rounds,
        }
    }

    async fn register(&self, player_id: &str) -> Result<PlayerSession> {
        self.bounded(self.registry.register(player_id, Utc::now()))
            .await
            .map_err(|e| unavailable("register", e))?;

        let initial = self.rules.initial_balance;
        let session = PlayerSession {
            player_id: player_id.to_string(),
            session_id: new_session_id(),
            balance: initial,
            rounds_played: 0,
            is_over: self.is_terminal(initial, 0),
            balance_history: vec![initial],
            dirty: false,
            max_rounds: self.rules.max_rounds,
        };

        self.bounded(self.store.save(player_id, &session.to_stored()))
            .await
            .map_err(|e| unavailable("initial save", e))?;

        info!("Registered new player {} with balance {}", player_id, initial);
        Ok(session)
    }

    /// Resolve one wager against the coin.
    ///
    /// Precondition failures leave `session` untouched. A failed save does not
    /// undo the round: the outcome is returned with `persisted == false` and
    /// the session stays `dirty` until a later save succeeds.
    pub async fn place_wager(
        &self,
        session: &mut PlayerSession,
        amount: Decimal,
        predicted: Side,
    ) -> Result<WagerOutcome> {
        if session.is_over || self.is_terminal(session.balance, session.rounds_played) {
            return Err(GameError::SessionAlreadyOver(session.player_id.clone()));
        }
        if amount <= Decimal::ZERO {
            return Err(GameError::InvalidWager(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        if amount.round_dp(2) != amount {
            return Err(GameError::InvalidWager(format!(
                "amount must be in whole cents, got {}",
                amount
            )));
        }
        if amount > session.balance {
            return Err(GameError::InvalidWager(format!(
                "amount {} exceeds balance {}",
                amount, session.balance
            )));
        }
        if session.balance.checked_add(amount).is_none() {
            return Err(GameError::InvalidWager(format!(
                "amount {} would overflow the balance",
                amount
            )));
        }

        let outcome = self.coin.flip();
        let won = outcome == predicted;
        let balance_before = session.balance;
        let balance_after = if won {
            balance_before + amount
        } else {
            balance_before - amount
        };
        let round = session.rounds_played + 1;
        let is_over = self.is_terminal(balance_after, round);

        session.rounds_played = round;
        session.balance = balance_after;
        session.balance_history.push(balance_after);
        session.is_over = is_over;
        session.dirty = true;

        debug!(
            "{} round {}: bet {} on {}, flipped {}, balance {} -> {}",
            session.player_id, round, amount, predicted, outcome, balance_before, balance_after
        );

        let saved = self.save(session).await;
        let persisted = match saved {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Round {} for {} not persisted, will retry on next save: {}",
                    round, session.player_id, e
                );
                false
            }
        };

        if let Some(round_log) = &self.round_log {
            let record = RoundRecord {
                session_id: session.session_id.clone(),
                player_id: session.player_id.clone(),
                round,
                wager: amount,
                predicted,
                outcome,
                balance_before,
                balance_after,
                timestamp: Utc::now(),
            };
            if let Err(e) = self.bounded(round_log.record_round(&record)).await {
                warn!("Failed to log round {} for {}: {}", round, session.player_id, e);
            }
        }

        if is_over {
            info!(
                "Game over for {} after {} rounds, final balance {}",
                session.player_id, round, balance_after
            );
            let status = final_status(balance_after);
            if let Err(e) = self
                .bounded(self.registry.mark_finished(&session.player_id, &status))
                .await
            {
                warn!("Failed to record final status for {}: {}", session.player_id, e);
            }
        }

        Ok(WagerOutcome {
            round,
            wager: amount,
            predicted,
            outcome,
            won,
            balance: balance_after,
            is_over,
            just_finished: is_over,
            persisted,
        })
    }

    /// Retry persisting a session whose last save failed
    pub async fn flush(&self, session: &mut PlayerSession) -> Result<()> {
        if !session.dirty {
            return Ok(());
        }
        if let Err(e) = self.save(session).await {
            return Err(GameError::PersistenceFailed {
                player_id: session.player_id.clone(),
                reason: e.to_string(),
            });
        }
        info!("Persisted pending rounds for {}", session.player_id);
        Ok(())
    }

    async fn save(&self, session: &mut PlayerSession) -> StoreResult<()> {
        self.bounded(self.store.save(&session.player_id, &session.to_stored()))
            .await?;
        session.dirty = false;
        Ok(())
    }

    async fn bounded<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "timed out after {:?}",
                self.store_timeout
            ))),
        }
    }
}

fn unavailable(operation: &'static str, e: StoreError) -> GameError {
    GameError::StoreUnavailable {
        operation,
        reason: e.to_string(),
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
