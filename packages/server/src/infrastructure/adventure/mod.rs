//! Adventure catalog implementations.

pub mod json_catalog;

pub use json_catalog::{AdventureLoadError, JsonAdventureCatalog};
