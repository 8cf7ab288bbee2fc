//! Domain layer: lobby model, value objects, and the ports the use cases depend on.

pub mod adventure;
pub mod adventure_catalog;
pub mod entity;
pub mod error;
pub mod lobby;
pub mod message_pusher;
pub mod repository;
pub mod story_generator;
pub mod value_object;

pub use adventure::{Adventure, Area, AreaId, Map};
pub use adventure_catalog::AdventureCatalog;
pub use entity::{Chapter, Connection};
pub use error::{GeneratorError, LobbyError, MessagePushError};
pub use lobby::{GameState, Lobby};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{LobbyRepository, SharedLobby};
pub use story_generator::{
    ChapterRequest, DEFAULT_DIRECTION, FALLBACK_CHAPTER_TEXT, FALLBACK_CHOICES, NO_CHOICE_MADE,
    PlayerState, RoundPlanRequest, StoryDirection, StoryGenerator, fallback_chapter,
    validate_chapter,
};
pub use value_object::{AdventureId, ConnectionId, LobbyId, LobbyIdFactory, PlayerName, Timestamp};

#[cfg(test)]
pub use story_generator::MockStoryGenerator;
