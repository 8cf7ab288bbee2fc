//! Story generator implementations.
//!
//! - `scripted`: deterministic offline chapters built from the adventure map
//! - `openrouter`: chat-completions client for an OpenAI-compatible API

pub mod openrouter;
pub mod prompt;
pub mod scripted;

pub use openrouter::OpenRouterStoryGenerator;
pub use scripted::ScriptedStoryGenerator;
