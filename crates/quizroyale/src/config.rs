//! Server configuration, loaded from an optional JSON file.

use std::path::Path;
use std::time::Duration;

use quizroyale_game::GameConfig;
use quizroyale_lobby::LobbyConfig;
use serde::{Deserialize, Serialize};

use crate::QuizError;

/// Everything the server needs to start. Every field has a default, so an
/// empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_address: String,

    /// How many accepted connections may wait for a lobby at once.
    /// Defaults to ten lobbies' worth.
    pub intake_queue_size: Option<usize>,

    /// Seconds an accepted connection gets to finish the WebSocket
    /// upgrade before it is dropped.
    pub handshake_timeout_secs: u64,

    pub lobby: LobbyConfig,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            intake_queue_size: None,
            handshake_timeout_secs: 10,
            lobby: LobbyConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            QuizError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.handshake_timeout_secs == 0 {
            return Err(QuizError::InvalidConfig(
                "handshake_timeout_secs must be at least 1".into(),
            ));
        }
        self.lobby.validate()?;
        self.game.validate()?;
        Ok(())
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn intake_queue_size(&self) -> usize {
        self.intake_queue_size
            .unwrap_or(self.lobby.capacity.saturating_mul(10))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.intake_queue_size(), 400);
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config: ServerConfig = serde_json::from_str(
            r#"{
                "bind_address": "127.0.0.1:9000",
                "intake_queue_size": 8,
                "lobby": { "capacity": 2, "start_when_full": false },
                "game": { "streak_for_level_up": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.intake_queue_size(), 8);
        assert_eq!(config.lobby.capacity, 2);
        assert!(!config.lobby.start_when_full);
        assert_eq!(config.lobby.eliminations_per_tick, 3);
        assert_eq!(config.game.streak_for_level_up, 3);
        assert_eq!(config.game.points_per_correct, 100);
    }

    #[test]
    fn test_validate_rejects_zero_handshake_timeout() {
        let config = ServerConfig {
            handshake_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(QuizError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_lobby() {
        let mut config = ServerConfig::default();
        config.lobby.capacity = 300;
        assert!(matches!(config.validate(), Err(QuizError::Lobby(_))));
    }

    #[test]
    fn test_validate_rejects_bad_game() {
        let mut config = ServerConfig::default();
        config.game.streak_for_level_up = 0;
        assert!(matches!(config.validate(), Err(QuizError::Game(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ServerConfig::load("/nonexistent/quizroyale.json");
        assert!(matches!(result, Err(QuizError::ConfigRead { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "quizroyale-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "lobby": { "capacity": 12 } }"#).unwrap();
        let config = ServerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.lobby.capacity, 12);
        assert_eq!(config.intake_queue_size(), 120);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = std::env::temp_dir().join(format!(
            "quizroyale-bad-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let result = ServerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(QuizError::ConfigParse(_))));
    }
}
