//! CoinFlip Challenge
//!
//! A wager game: a player starts with a fixed stake and bets on a coin that
//! lands Heads 60% of the time, for at most a fixed number of rounds.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API / CLI ──► Ledger ──► SessionStore   (balance, rounds, over)
//!                      │   └──► PlayerRegistry (registration, final status)
//!                      │   └──► RoundLog       (audit trail)
//!                      └──► CoinFlipper        (60/40 weighted draw)
//! ```

pub mod coin;
pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
