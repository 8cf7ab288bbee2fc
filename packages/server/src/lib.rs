//! Taleweave lobby server library.
//!
//! Coordinates multiplayer choose-your-own-adventure sessions: lobbies of
//! WebSocket-connected players who share one adventure and advance through
//! rounds of narrative only once every player has made a choice.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
