//! Configuration management
//!
//! Settings come from an optional TOML file layered with `COINFLIP__`
//! environment variables (e.g. `COINFLIP__GAME__MAX_ROUNDS=50`).

use crate::error::{GameError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Rules of the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Stake every new player starts with
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    /// Round cap per session
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Probability that a flip lands Heads
    #[serde(default = "default_heads_probability")]
    pub heads_probability: f64,
    /// Below this balance the session is over
    #[serde(default = "default_min_balance")]
    pub min_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Upper bound for any single store call
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    /// `players` table next to the session table
    #[default]
    Database,
    /// Append-only JSON lines file
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,
    /// File used by the jsonl backend
    #[serde(default = "default_registry_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_initial_balance() -> Decimal {
    dec!(25.00)
}
fn default_max_rounds() -> u32 {
    100
}
fn default_heads_probability() -> f64 {
    0.6
}
fn default_min_balance() -> Decimal {
    dec!(0.01)
}
fn default_db_path() -> String {
    "coinflip_log.db".to_string()
}
fn default_store_timeout_secs() -> u64 {
    5
}
fn default_registry_path() -> String {
    "registry.jsonl".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            max_rounds: default_max_rounds(),
            heads_probability: default_heads_probability(),
            min_balance: default_min_balance(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            path: default_registry_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (if present) and the environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = ::config::Config::builder()
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false))
            .add_source(
                ::config::Environment::with_prefix("COINFLIP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.database.path = expand_path(&config.database.path)?;
        config.registry.path = expand_path(&config.registry.path)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        if !(game.heads_probability > 0.0 && game.heads_probability < 1.0) {
            return Err(GameError::Config(format!(
                "heads_probability must be in (0, 1), got {}",
                game.heads_probability
            )));
        }
        if game.initial_balance <= Decimal::ZERO {
            return Err(GameError::Config("initial_balance must be positive".into()));
        }
        if game.initial_balance.round_dp(2) != game.initial_balance {
            return Err(GameError::Config("initial_balance must be in whole cents".into()));
        }
        if game.min_balance < Decimal::ZERO || game.min_balance > game.initial_balance {
            return Err(GameError::Config(
                "min_balance must be between 0 and initial_balance".into(),
            ));
        }
        if game.max_rounds == 0 {
            return Err(GameError::Config("max_rounds must be at least 1".into()));
        }
        if self.database.timeout_secs == 0 {
            return Err(GameError::Config("database.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

fn expand_path(path: &str) -> Result<String> {
    shellexpand::full(path)
        .map(|p| p.into_owned())
        .map_err(|e| GameError::Config(format!("cannot expand path {}: {}", path, e)))
}
