//! Entities owned by a lobby: player connections and their chapters.

use serde::Serialize;

use super::{ConnectionId, PlayerName, Timestamp};

/// One client's membership in a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: PlayerName,
    pub ready: bool,
    /// Cosmetic character name chosen by the player, if any.
    pub character: Option<String>,
    pub joined_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, name: PlayerName, joined_at: Timestamp) -> Self {
        Self {
            id,
            name,
            ready: false,
            character: None,
            joined_at,
        }
    }

    /// Name the story should address the player by.
    pub fn story_name(&self) -> &str {
        self.character.as_deref().unwrap_or(self.name.as_str())
    }

    /// Flip the ready flag and return the new value.
    pub fn toggle_ready(&mut self) -> bool {
        self.ready = !self.ready;
        self.ready
    }
}

/// One unit of narrative with a fixed list of choices.
///
/// `choice` stays `None` until the owning player answers. The choice list is
/// produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    text: String,
    choices: Vec<String>,
    choice: Option<usize>,
}

impl Chapter {
    pub fn new(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            text: text.into(),
            choices,
            choice: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn choice(&self) -> Option<usize> {
        self.choice
    }

    /// Record the player's choice. Later calls overwrite earlier ones.
    pub fn record_choice(&mut self, index: usize) {
        self.choice = Some(index);
    }

    /// Label of the recorded choice, if it points into the choice list.
    pub fn chosen_label(&self) -> Option<&str> {
        self.choice
            .and_then(|index| self.choices.get(index))
            .map(String::as_str)
    }

    /// A chapter counts as answered only when its choice resolves to a label,
    /// so an empty choice list can never be answered.
    pub fn is_answered(&self) -> bool {
        self.chosen_label().is_some()
    }
}
