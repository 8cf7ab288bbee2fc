//! Repository trait definitions.
//!
//! The domain defines the storage interfaces it needs; the infrastructure layer
//! provides the implementations (dependency inversion).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Adventure, Lobby, LobbyError, LobbyId, Timestamp};

/// A live lobby behind its own lock. Holding the lock serializes every
/// mutation of that lobby.
pub type SharedLobby = Arc<Mutex<Lobby>>;

/// Lobby registry.
///
/// The registry map has its own short-held lock, independent of the per-lobby
/// locks handed out by [`LobbyRepository::find_lobby`]. Implementations take the
/// registry lock before a lobby lock, never the other way round.
#[async_trait]
pub trait LobbyRepository: Send + Sync {
    /// Store a new lobby under a fresh id that collides with no live lobby.
    async fn create_lobby(
        &self,
        max_players: usize,
        adventure: Arc<Adventure>,
        created_at: Timestamp,
    ) -> LobbyId;

    /// Handle to a live lobby for mutation.
    async fn find_lobby(&self, lobby_id: &LobbyId) -> Result<SharedLobby, LobbyError>;

    /// Detached snapshot of a lobby.
    async fn get_lobby(&self, lobby_id: &LobbyId) -> Result<Lobby, LobbyError>;

    /// Drop the lobby if it has no connections left. Returns whether it was removed.
    async fn remove_if_empty(&self, lobby_id: &LobbyId) -> bool;

    /// Detached snapshots of every lobby, oldest first.
    async fn list_all(&self) -> Vec<Lobby>;

    async fn count_lobbies(&self) -> usize;
}
