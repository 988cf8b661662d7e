use std::net::SocketAddr;
use std::time::Duration;

use common::config::Validate;
use common::tictactoe::{DEFAULT_COMPUTER_MOVE_DELAY, Difficulty, Mark, TicTacToeSessionSettings};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "tictactoe_server.yaml";
pub const MAX_COMPUTER_MOVE_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub static_files_path: String,
    pub computer_move_delay_ms: u64,
    pub default_difficulty: Difficulty,
    pub player_mark: Mark,
    /// Empty means everybody may play without signing in.
    pub access_tokens: Vec<String>,
}

impl ServerConfig {
    pub fn session_settings(&self) -> TicTacToeSessionSettings {
        TicTacToeSessionSettings {
            player_mark: self.player_mark,
            difficulty: self.default_difficulty,
            computer_move_delay: Duration::from_millis(self.computer_move_delay_ms),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|e| format!("bind_address '{}' is invalid: {}", self.bind_address, e))?;
        if self.static_files_path.is_empty() {
            return Err("static_files_path must not be empty".to_string());
        }
        if self.computer_move_delay_ms > MAX_COMPUTER_MOVE_DELAY_MS {
            return Err(format!(
                "computer_move_delay_ms must not exceed {}",
                MAX_COMPUTER_MOVE_DELAY_MS
            ));
        }
        if self.player_mark == Mark::Empty {
            return Err("player_mark must be X or O".to_string());
        }
        if self.access_tokens.iter().any(|token| token.trim().is_empty()) {
            return Err("access_tokens must not contain blank entries".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            static_files_path: "server/static".to_string(),
            computer_move_delay_ms: DEFAULT_COMPUTER_MOVE_DELAY.as_millis() as u64,
            default_difficulty: Difficulty::Easy,
            player_mark: Mark::X,
            access_tokens: Vec::new(),
        }
    }
}
