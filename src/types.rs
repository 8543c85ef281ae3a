//! Core game types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A face of the coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Heads,
    Tails,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Heads => Side::Tails,
            Side::Tails => Side::Heads,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Heads => f.pad("HEADS"),
            Side::Tails => f.pad("TAILS"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "h" | "heads" => Ok(Side::Heads),
            "t" | "tails" => Ok(Side::Tails),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// Session fields as persisted by a [`crate::storage::SessionStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub balance: Decimal,
    pub rounds_played: u32,
    pub is_over: bool,
}

/// One player's game, owned by the caller and threaded through the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSession {
    /// Player email
    pub player_id: String,
    /// Identifier of this sitting, tags the round log
    pub session_id: String,
    pub balance: Decimal,
    pub rounds_played: u32,
    pub is_over: bool,
    /// Balance after each round of this sitting, starting with the opening balance.
    /// Not durable: a resumed session starts over from its stored balance.
    pub balance_history: Vec<Decimal>,
    /// Last resolved round has not reached the store yet
    pub dirty: bool,
    /// Round cap this session was started under
    pub max_rounds: u32,
}

impl PlayerSession {
    pub fn rounds_remaining(&self) -> u32 {
        self.max_rounds.saturating_sub(self.rounds_played)
    }

    /// Default stake offered to the player: 10% of the balance, at least one cent
    pub fn suggested_wager(&self) -> Decimal {
        let tenth = (self.balance * dec!(0.1)).round_dp(2);
        tenth.max(dec!(0.01)).min(self.balance.max(Decimal::ZERO))
    }

    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            balance: self.balance,
            rounds_played: self.rounds_played,
            is_over: self.is_over,
        }
    }
}

/// Result of one resolved wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerOutcome {
    /// Round number just played (1-based)
    pub round: u32,
    pub wager: Decimal,
    pub predicted: Side,
    pub outcome: Side,
    pub won: bool,
    pub balance: Decimal,
    pub is_over: bool,
    /// This round ended the session
    pub just_finished: bool,
    /// Store accepted the updated session
    pub persisted: bool,
}

/// Audit entry for one resolved wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub session_id: String,
    pub player_id: String,
    pub round: u32,
    pub wager: Decimal,
    pub predicted: Side,
    pub outcome: Side,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub timestamp: DateTime<Utc>,
}
