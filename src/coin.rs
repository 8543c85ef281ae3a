//! Coin flip sources
//!
//! The ledger never draws randomness itself; it asks a [`CoinFlipper`].
//! [`RandomCoin`] is the weighted coin used in play, [`ScriptedCoin`]
//! replays fixed outcomes for tests and demos.

use crate::types::Side;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of flip outcomes
pub trait CoinFlipper: Send + Sync {
    fn flip(&self) -> Side;
}

/// Heads when the uniform draw `r` in [0, 1) falls below `heads_probability`
pub fn side_for_draw(r: f64, heads_probability: f64) -> Side {
    if r < heads_probability {
        Side::Heads
    } else {
        Side::Tails
    }
}

/// Weighted coin backed by a pseudo-random generator
pub struct RandomCoin {
    heads_probability: f64,
    rng: Mutex<StdRng>,
}

impl RandomCoin {
    pub fn new(heads_probability: f64) -> Self {
        Self {
            heads_probability,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic coin for reproducible simulations
    pub fn seeded(heads_probability: f64, seed: u64) -> Self {
        Self {
            heads_probability,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn heads_probability(&self) -> f64 {
        self.heads_probability
    }
}

impl CoinFlipper for RandomCoin {
    fn flip(&self) -> Side {
        let r: f64 = self.rng.lock().random();
        side_for_draw(r, self.heads_probability)
    }
}

/// Replays a fixed sequence of outcomes, then repeats the fallback side
pub struct ScriptedCoin {
    script: Mutex<VecDeque<Side>>,
    fallback: Side,
}

impl ScriptedCoin {
    pub fn new(script: impl IntoIterator<Item = Side>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Side::Heads,
        }
    }

    /// Coin that always lands on `side`
    pub fn always(side: Side) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: side,
        }
    }

    pub fn push(&self, side: Side) {
        self.script.lock().push_back(side);
    }
}

impl CoinFlipper for ScriptedCoin {
    fn flip(&self) -> Side {
        self.script.lock().pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_for_draw_boundary() {
        assert_eq!(side_for_draw(0.0, 0.6), Side::Heads);
        assert_eq!(side_for_draw(0.5999, 0.6), Side::Heads);
        // exactly at the threshold is Tails
        assert_eq!(side_for_draw(0.6, 0.6), Side::Tails);
        assert_eq!(side_for_draw(0.9999, 0.6), Side::Tails);
    }

    #[test]
    fn test_random_coin_bias() {
        let coin = RandomCoin::seeded(0.6, 42);
        let flips = 20_000;
        let heads = (0..flips).filter(|_| coin.flip() == Side::Heads).count();
        let ratio = heads as f64 / flips as f64;
        assert!(ratio > 0.58 && ratio < 0.62, "heads ratio {}", ratio);
    }

    #[test]
    fn test_seeded_coin_is_reproducible() {
        let a = RandomCoin::seeded(0.6, 7);
        let b = RandomCoin::seeded(0.6, 7);
        let seq_a: Vec<Side> = (0..50).map(|_| a.flip()).collect();
        let seq_b: Vec<Side> = (0..50).map(|_| b.flip()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_scripted_coin() {
        let coin = ScriptedCoin::new([Side::Tails, Side::Heads]);
        assert_eq!(coin.flip(), Side::Tails);
        assert_eq!(coin.flip(), Side::Heads);
        // exhausted: fallback
        assert_eq!(coin.flip(), Side::Heads);

        coin.push(Side::Tails);
        assert_eq!(coin.flip(), Side::Tails);
    }

    #[test]
    fn test_always_coin() {
        let coin = ScriptedCoin::always(Side::Tails);
        for _ in 0..5 {
            assert_eq!(coin.flip(), Side::Tails);
        }
    }
}
