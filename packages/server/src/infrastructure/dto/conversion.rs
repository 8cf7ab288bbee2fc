//! Conversion logic from domain models to DTOs.

use taleweave_shared::time::timestamp_to_rfc3339;

use crate::domain::{Adventure, Chapter, Connection, Lobby};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Model → WebSocket DTO
// ========================================

impl From<&Connection> for dto::PlayerInfo {
    fn from(connection: &Connection) -> Self {
        Self {
            name: connection.name.as_str().to_string(),
            is_ready: connection.ready,
        }
    }
}

impl From<&Lobby> for dto::LobbyInfo {
    fn from(lobby: &Lobby) -> Self {
        Self {
            id: lobby.id.as_str().to_string(),
            max_players: lobby.max_players,
            current_players: lobby.connections.len(),
            adventure_title: lobby.adventure.title.clone(),
            adventure_description: lobby.adventure.description.clone(),
            game_started: lobby.game_state.started,
            current_round: lobby.game_state.round,
            players: lobby.connections.iter().map(dto::PlayerInfo::from).collect(),
            is_full: lobby.is_full(),
        }
    }
}

impl dto::RoundInfo {
    pub fn from_chapter(round_index: u32, chapter: &Chapter) -> Self {
        Self {
            round_index,
            text: chapter.text().to_string(),
            choices: chapter.choices().to_vec(),
        }
    }
}

// ========================================
// Domain Model → HTTP DTO
// ========================================

impl From<&Lobby> for http::LobbySummaryDto {
    fn from(lobby: &Lobby) -> Self {
        Self {
            info: dto::LobbyInfo::from(lobby),
            created_at: timestamp_to_rfc3339(lobby.created_at.value()),
        }
    }
}

impl From<&[Lobby]> for http::LobbyListDto {
    fn from(lobbies: &[Lobby]) -> Self {
        Self {
            total_lobbies: lobbies.len(),
            lobbies: lobbies.iter().map(http::LobbySummaryDto::from).collect(),
        }
    }
}

impl From<&Adventure> for http::AdventureDto {
    fn from(adventure: &Adventure) -> Self {
        let map = &adventure.map;
        Self {
            id: adventure.id.0,
            title: adventure.title.clone(),
            description: adventure.description.clone(),
            min_players: adventure.min_players,
            max_players: adventure.max_players,
            image_url: adventure.image.clone(),
            areas: map
                .areas()
                .iter()
                .map(|area| http::AreaDto {
                    id: area.id,
                    name: area.name.clone(),
                    description: area.description.clone(),
                    connections: map.connected(area.id),
                })
                .collect(),
        }
    }
}
