//! Value objects of the lobby domain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LobbyError;

/// Number of characters in a generated lobby id.
pub const LOBBY_ID_LEN: usize = 8;

/// Short identifier of a lobby, shared with players to join it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LobbyId(String);

impl LobbyId {
    /// Wrap an existing id. Empty or blank ids are rejected as not found.
    pub fn new(value: String) -> Result<Self, LobbyError> {
        if value.trim().is_empty() {
            return Err(LobbyError::LobbyNotFound(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates short random lobby ids.
///
/// Uniqueness against live lobbies is checked by the registry, not here.
pub struct LobbyIdFactory;

impl LobbyIdFactory {
    pub fn generate() -> LobbyId {
        let simple = Uuid::new_v4().simple().to_string();
        LobbyId(simple[..LOBBY_ID_LEN].to_string())
    }
}

/// Process-unique identity of one connection, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an adventure in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdventureId(pub u32);

impl fmt::Display for AdventureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name of a player inside a lobby ("Player N").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    const PREFIX: &'static str = "Player ";

    /// Name for the given 1-based seat number.
    pub fn numbered(number: usize) -> Self {
        Self(format!("{}{}", Self::PREFIX, number))
    }

    /// Seat number if the name follows the "Player N" scheme.
    pub fn number(&self) -> Option<usize> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Millisecond Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
