//! Shared application state.

use std::sync::Arc;

use taleweave_shared::time::Clock;

use crate::{
    domain::{AdventureCatalog, LobbyRepository, MessagePusher, StoryGenerator},
    usecase::{
        BroadcastService, CreateLobbyUseCase, GetAdventuresUseCase, GetLobbiesUseCase,
        GetLobbyDetailUseCase, JoinLobbyUseCase, LeaveLobbyUseCase, RoundEngine,
        StartAdventureUseCase, SubmitChoiceUseCase, ToggleReadyUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// BroadcastService（ロビー内への配信）
    pub broadcast: Arc<BroadcastService>,
    pub create_lobby_usecase: CreateLobbyUseCase,
    pub get_lobbies_usecase: GetLobbiesUseCase,
    pub get_lobby_detail_usecase: GetLobbyDetailUseCase,
    pub get_adventures_usecase: GetAdventuresUseCase,
    pub join_lobby_usecase: JoinLobbyUseCase,
    pub leave_lobby_usecase: LeaveLobbyUseCase,
    pub toggle_ready_usecase: ToggleReadyUseCase,
    pub start_adventure_usecase: StartAdventureUseCase,
    pub submit_choice_usecase: SubmitChoiceUseCase,
}

impl AppState {
    /// Wire every use case on top of the given ports.
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        catalog: Arc<dyn AdventureCatalog>,
        story_generator: Arc<dyn StoryGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let broadcast = Arc::new(BroadcastService::new(
            repository.clone(),
            message_pusher.clone(),
        ));
        let round_engine = Arc::new(RoundEngine::new(
            story_generator,
            repository.clone(),
            broadcast.clone(),
        ));

        Self {
            create_lobby_usecase: CreateLobbyUseCase::new(
                repository.clone(),
                catalog.clone(),
                clock.clone(),
            ),
            get_lobbies_usecase: GetLobbiesUseCase::new(repository.clone()),
            get_lobby_detail_usecase: GetLobbyDetailUseCase::new(repository.clone()),
            get_adventures_usecase: GetAdventuresUseCase::new(catalog),
            join_lobby_usecase: JoinLobbyUseCase::new(
                repository.clone(),
                message_pusher,
                broadcast.clone(),
                clock,
            ),
            leave_lobby_usecase: LeaveLobbyUseCase::new(broadcast.clone(), round_engine.clone()),
            toggle_ready_usecase: ToggleReadyUseCase::new(repository.clone(), broadcast.clone()),
            start_adventure_usecase: StartAdventureUseCase::new(
                repository.clone(),
                round_engine.clone(),
                broadcast.clone(),
            ),
            submit_choice_usecase: SubmitChoiceUseCase::new(
                repository,
                round_engine,
                broadcast.clone(),
            ),
            broadcast,
        }
    }
}
