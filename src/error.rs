//! Error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

/// Errors surfaced by the ledger and its presentation layers
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid player id: {0}")]
    InvalidPlayer(String),

    #[error("Invalid wager: {0}")]
    InvalidWager(String),

    #[error("Session for {0} is already over")]
    SessionAlreadyOver(String),

    #[error("Store unavailable during {operation}: {reason}")]
    StoreUnavailable { operation: &'static str, reason: String },

    #[error("Failed to persist session for {player_id}: {reason}")]
    PersistenceFailed { player_id: String, reason: String },

    #[error("No live session for {0}")]
    SessionNotFound(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<::config::ConfigError> for GameError {
    fn from(e: ::config::ConfigError) -> Self {
        GameError::Config(e.to_string())
    }
}

impl GameError {
    /// Whether the player can fix the request and try again
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, GameError::InvalidPlayer(_) | GameError::InvalidWager(_))
    }
}

/// Errors raised by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record for {player_id}: {detail}")]
    Corrupt { player_id: String, detail: String },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::InvalidWager("amount must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid wager: amount must be positive");

        let err = GameError::StoreUnavailable {
            operation: "load",
            reason: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "Store unavailable during load: timed out");

        let err = GameError::SessionAlreadyOver("a@x.com".to_string());
        assert_eq!(err.to_string(), "Session for a@x.com is already over");
    }

    #[test]
    fn test_user_correctable() {
        assert!(GameError::InvalidWager("x".into()).is_user_correctable());
        assert!(GameError::InvalidPlayer("".into()).is_user_correctable());
        assert!(!GameError::SessionAlreadyOver("a".into()).is_user_correctable());
        assert!(!GameError::PersistenceFailed {
            player_id: "a".into(),
            reason: "down".into()
        }
        .is_user_correctable());
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
