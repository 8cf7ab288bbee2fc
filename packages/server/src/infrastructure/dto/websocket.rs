//! WebSocket message DTOs.

use serde::{Deserialize, Serialize};

/// Kind of an outbound message, sent as its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    LobbyInfo,
    StartAdventure,
    NewRound,
    ChoiceRecorded,
    Error,
}

/// Messages a client may send.
///
/// The upper-case aliases are the names used by earlier clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(alias = "SWITCH_READY_STATE")]
    ToggleReady,
    #[serde(alias = "START_GAME")]
    StartAdventure,
    #[serde(alias = "SUBMIT_CHOICE")]
    SubmitChoice { choice_index: i64 },
}

/// One player as listed in the lobby view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub is_ready: bool,
}

/// Full lobby view broadcast after every lobby change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyInfo {
    pub id: String,
    pub max_players: usize,
    pub current_players: usize,
    pub adventure_title: String,
    pub adventure_description: String,
    pub game_started: bool,
    pub current_round: u32,
    pub players: Vec<PlayerInfo>,
    pub is_full: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyInfoMessage {
    pub r#type: MessageType,
    pub lobby: LobbyInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAdventureInfo {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAdventureMessage {
    pub r#type: MessageType,
    pub info: StartAdventureInfo,
}

/// One player's chapter for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round_index: u32,
    pub text: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoundMessage {
    pub r#type: MessageType,
    pub info: RoundInfo,
}

/// Acknowledgement of a submitted choice while the round is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecordedMessage {
    pub r#type: MessageType,
    pub choice_index: usize,
    pub waiting_for: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub message: String,
}

impl LobbyInfoMessage {
    pub fn new(lobby: LobbyInfo) -> Self {
        Self {
            r#type: MessageType::LobbyInfo,
            lobby,
        }
    }
}

impl StartAdventureMessage {
    pub fn success() -> Self {
        Self {
            r#type: MessageType::StartAdventure,
            info: StartAdventureInfo { success: true },
        }
    }
}

impl NewRoundMessage {
    pub fn new(info: RoundInfo) -> Self {
        Self {
            r#type: MessageType::NewRound,
            info,
        }
    }
}

impl ChoiceRecordedMessage {
    pub fn new(choice_index: usize, waiting_for: usize) -> Self {
        Self {
            r#type: MessageType::ChoiceRecorded,
            choice_index,
            waiting_for,
        }
    }
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            message: message.into(),
        }
    }
}

/// Serialize an outbound message.
pub fn encode<T: Serialize>(message: &T) -> String {
    serde_json::to_string(message).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize outbound message: {}", e);
        r#"{"type":"error","message":"internal serialization error"}"#.to_string()
    })
}
