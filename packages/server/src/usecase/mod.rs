//! UseCase layer: one use case per lobby operation.
//!
//! Use cases depend on the domain ports (`LobbyRepository`, `MessagePusher`,
//! `StoryGenerator`, `AdventureCatalog`) and never on concrete infrastructure,
//! apart from the outbound DTOs they serialize.

mod adventures;
mod advance_round;
mod broadcast;
mod create_lobby;
mod get_lobbies;
mod join_lobby;
mod leave_lobby;
mod start_adventure;
mod submit_choice;
mod toggle_ready;

#[cfg(test)]
pub(crate) mod test_support;

pub use adventures::GetAdventuresUseCase;
pub use advance_round::RoundEngine;
pub use broadcast::BroadcastService;
pub use create_lobby::CreateLobbyUseCase;
pub use get_lobbies::{GetLobbiesUseCase, GetLobbyDetailUseCase};
pub use join_lobby::JoinLobbyUseCase;
pub use leave_lobby::LeaveLobbyUseCase;
pub use start_adventure::StartAdventureUseCase;
pub use submit_choice::{ChoiceOutcome, SubmitChoiceUseCase};
pub use toggle_ready::ToggleReadyUseCase;
