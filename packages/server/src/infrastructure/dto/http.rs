//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::LobbyInfo;

/// Query of `POST /lobby/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLobbyQuery {
    pub max_players: i64,
    pub adventure_id: u32,
}

/// Query of `GET /adventure`. Either bound alone narrows the list to
/// adventures playable with that many players.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdventureListQuery {
    pub min_players: Option<usize>,
    pub max_players: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLobbyResponse {
    pub lobby_id: String,
}

/// Lobby view plus its creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySummaryDto {
    #[serde(flatten)]
    pub info: LobbyInfo,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyListDto {
    pub total_lobbies: usize,
    pub lobbies: Vec<LobbySummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDto {
    pub id: usize,
    pub name: String,
    pub description: String,
    pub connections: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureDto {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub min_players: usize,
    pub max_players: usize,
    pub image_url: Option<String>,
    pub areas: Vec<AreaDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureListDto {
    pub adventures: Vec<AdventureDto>,
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub detail: String,
}
