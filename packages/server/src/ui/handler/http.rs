//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{AdventureId, Lobby, LobbyError},
    infrastructure::dto::{
        http::{
            AdventureDto, AdventureListDto, AdventureListQuery, CreateLobbyQuery, CreateLobbyResponse, ErrorDto,
            LobbyListDto,
        },
        websocket::LobbyInfo,
    },
    ui::state::AppState,
};

type ApiError = (StatusCode, Json<ErrorDto>);

fn api_error(error: LobbyError) -> ApiError {
    let status = match error {
        LobbyError::LobbyNotFound(_) | LobbyError::AdventureNotFound(_) => StatusCode::NOT_FOUND,
        LobbyError::LobbyFull(_) | LobbyError::AlreadyStarted => StatusCode::FORBIDDEN,
        LobbyError::InvalidCapacity(_)
        | LobbyError::ConnectionNotFound(_)
        | LobbyError::NotAllReady => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorDto {
            detail: error.to_string(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a lobby for an adventure
pub async fn create_lobby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CreateLobbyQuery>,
) -> Result<Json<CreateLobbyResponse>, ApiError> {
    let lobby_id = state
        .create_lobby_usecase
        .execute(query.max_players, AdventureId(query.adventure_id))
        .await
        .map_err(api_error)?;

    Ok(Json(CreateLobbyResponse {
        lobby_id: lobby_id.into_string(),
    }))
}

/// Get list of lobbies
pub async fn get_lobbies(State(state): State<Arc<AppState>>) -> Json<LobbyListDto> {
    let lobbies: Vec<Lobby> = state.get_lobbies_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(LobbyListDto::from(lobbies.as_slice()))
}

/// Get lobby detail by ID
pub async fn get_lobby(
    State(state): State<Arc<AppState>>,
    Path(lobby_id): Path<String>,
) -> Result<Json<LobbyInfo>, ApiError> {
    let lobby = state
        .get_lobby_detail_usecase
        .execute(lobby_id)
        .await
        .map_err(api_error)?;

    Ok(Json(LobbyInfo::from(&lobby)))
}

/// Get list of adventures, optionally only those fitting a player count
pub async fn get_adventures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdventureListQuery>,
) -> Json<AdventureListDto> {
    let adventures = state
        .get_adventures_usecase
        .list(query.min_players, query.max_players)
        .iter()
        .map(|adventure| AdventureDto::from(adventure.as_ref()))
        .collect();

    Json(AdventureListDto { adventures })
}

/// Get adventure detail, including its map
pub async fn get_adventure(
    State(state): State<Arc<AppState>>,
    Path(adventure_id): Path<u32>,
) -> Result<Json<AdventureDto>, ApiError> {
    let adventure = state
        .get_adventures_usecase
        .detail(AdventureId(adventure_id))
        .map_err(api_error)?;

    Ok(Json(AdventureDto::from(adventure.as_ref())))
}
