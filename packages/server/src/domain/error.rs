//! Error types of the lobby domain.

use thiserror::Error;

use super::{AdventureId, ConnectionId};

/// Caller-visible lobby failures.
///
/// These are reported to the triggering client only and never affect other
/// players in the lobby. The display strings double as WebSocket close reasons
/// and HTTP error details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("Lobby with id : '{0}' was not found.")]
    LobbyNotFound(String),

    #[error("Lobby with ID {0} is full.")]
    LobbyFull(String),

    #[error("Invalid player limits: max_players must be at least 1 (got {0})")]
    InvalidCapacity(i64),

    #[error("Adventure with ID {0} not found")]
    AdventureNotFound(AdventureId),

    #[error("Connection '{0}' not found in lobby")]
    ConnectionNotFound(ConnectionId),

    #[error("All players must be ready")]
    NotAllReady,

    #[error("The adventure has already started")]
    AlreadyStarted,
}

/// Per-recipient delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' is not registered")]
    ClientNotFound(ConnectionId),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Timed out pushing message to client '{0}'")]
    Timeout(ConnectionId),
}

/// Story generator failure. Always recovered with a fallback chapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("Story request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid story response: {0}")]
    InvalidResponse(String),

    #[error("Story generator unavailable: {0}")]
    Unavailable(String),
}
