//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{create_lobby, get_adventure, get_adventures, get_lobbies, get_lobby, health_check};
pub use websocket::join_lobby_handler;
