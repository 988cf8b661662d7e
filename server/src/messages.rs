use common::tictactoe::{Difficulty, GameSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SelectCell { index: usize },
    Reset,
    SetDifficulty { difficulty: Difficulty },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { session_id: String },
    State(GameSnapshot),
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to decode client message: {}", e))
    }
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to encode server message: {}", e))
    }
}
