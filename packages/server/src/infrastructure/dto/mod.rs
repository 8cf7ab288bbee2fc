//! Data Transfer Objects (DTOs) for the lobby server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API request and response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
