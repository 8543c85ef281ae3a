//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.initial_balance, dec!(25.00));
        assert_eq!(config.max_rounds, 100);
        assert_eq!(config.heads_probability, 0.6);
        assert_eq!(config.min_balance, dec!(0.01));
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.game.max_rounds, 100);
        assert_eq!(config.database.path, "coinflip_log.db");
        assert_eq!(config.database.timeout_secs, 5);
        assert_eq!(config.registry.backend, RegistryBackend::Database);
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_game_section_overrides() {
        let toml_str = r#"
[game]
initial_balance = "50.00"
max_rounds = 10
heads_probability = 0.55
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.game.initial_balance, dec!(50.00));
        assert_eq!(config.game.max_rounds, 10);
        assert_eq!(config.game.heads_probability, 0.55);
        // untouched field keeps its default
        assert_eq!(config.game.min_balance, dec!(0.01));
    }

    #[test]
    fn test_registry_backend_jsonl() {
        let toml_str = r#"
[registry]
backend = "jsonl"
path = "/tmp/players.jsonl"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.registry.backend, RegistryBackend::Jsonl);
        assert_eq!(config.registry.path, "/tmp/players.jsonl");
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut config = Config::default();
        config.game.heads_probability = 1.0;
        assert!(config.validate().is_err());

        config.game.heads_probability = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_rounds_and_stake() {
        let mut config = Config::default();
        config.game.max_rounds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.game.initial_balance = dec!(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_sub_cent_stake() {
        let mut config = Config::default();
        config.game.initial_balance = dec!(25.005);
        assert!(config.validate().is_err());

        config.game.initial_balance = dec!(25.000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.database.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_duration() {
        let config = DatabaseConfig::default();
        assert_eq!(config.timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[game]
max_rounds = 20

[database]
path = "games.db"

[server]
port = 9090
"#
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.game.max_rounds, 20);
        assert_eq!(config.database.path, "games.db");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.game.initial_balance, dec!(25.00));
    }
}
