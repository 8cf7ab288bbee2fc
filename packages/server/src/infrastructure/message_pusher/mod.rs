//! Implementations of the `MessagePusher` port.
//!
//! - `websocket`: pushes into the channel drained by each client's socket task

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
