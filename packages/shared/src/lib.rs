//! Helpers shared by the Taleweave binaries: logging setup and time utilities.

pub mod logger;
pub mod time;
