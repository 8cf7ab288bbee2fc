//! Adventure catalog loaded from a JSON document.
//!
//! The document is a list of adventures, each with a map whose areas are keyed
//! by name:
//!
//! ```json
//! [{
//!   "id": 1, "title": "...", "description": "...",
//!   "min_players": 1, "max_players": 4, "image": "cover.png",
//!   "map": { "areas": {
//!     "entrance": { "name": "Entrance Hall", "description": "...", "connections": ["library"] }
//!   } }
//! }]
//! ```
//!
//! Areas are numbered from 0 in key order. Connections to unknown keys are
//! skipped, and malformed adventures are skipped with a warning so one bad
//! entry does not take the whole catalog down.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Adventure, AdventureCatalog, AdventureId, Area, Map};

/// Catalog compiled into the binary.
const BUILTIN_ADVENTURES: &str = include_str!("../../../assets/adventures.json");

#[derive(Debug, Error)]
pub enum AdventureLoadError {
    #[error("Failed to read adventures file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in adventures file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct AdventureRecord {
    id: u32,
    title: String,
    description: String,
    min_players: usize,
    max_players: usize,
    #[serde(default)]
    image: Option<String>,
    map: MapRecord,
}

#[derive(Debug, Deserialize)]
struct MapRecord {
    areas: BTreeMap<String, AreaRecord>,
}

#[derive(Debug, Deserialize)]
struct AreaRecord {
    name: String,
    description: String,
    #[serde(default)]
    connections: Vec<String>,
}

impl From<AdventureRecord> for Adventure {
    fn from(record: AdventureRecord) -> Self {
        let ids: BTreeMap<&str, usize> = record
            .map
            .areas
            .keys()
            .enumerate()
            .map(|(index, key)| (key.as_str(), index))
            .collect();

        let areas = record
            .map
            .areas
            .values()
            .enumerate()
            .map(|(index, area)| Area::new(index, area.name.clone(), area.description.clone()))
            .collect();
        let mut map = Map::new(areas);

        for (key, area) in &record.map.areas {
            let from = ids[key.as_str()];
            for target in &area.connections {
                match ids.get(target.as_str()) {
                    Some(&to) => map.add_connection(from, to),
                    None => tracing::warn!(
                        "Adventure {}: area '{}' connects to unknown area '{}', skipping",
                        record.id,
                        key,
                        target
                    ),
                }
            }
        }

        Adventure {
            id: AdventureId(record.id),
            title: record.title,
            description: record.description,
            min_players: record.min_players,
            max_players: record.max_players,
            image: record.image,
            map,
        }
    }
}

/// Adventures parsed once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct JsonAdventureCatalog {
    adventures: Vec<Arc<Adventure>>,
}

impl JsonAdventureCatalog {
    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, AdventureLoadError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;

        let mut adventures = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<AdventureRecord>(entry) {
                Ok(record) => {
                    tracing::debug!("Loaded adventure '{}' (ID: {})", record.title, record.id);
                    adventures.push(Arc::new(Adventure::from(record)));
                }
                Err(e) => tracing::warn!("Skipping malformed adventure: {}", e),
            }
        }

        tracing::info!("Loaded {} adventures", adventures.len());
        Ok(Self { adventures })
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AdventureLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AdventureLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Catalog shipped with the server.
    pub fn builtin() -> Result<Self, AdventureLoadError> {
        Self::from_json(BUILTIN_ADVENTURES)
    }

    pub fn len(&self) -> usize {
        self.adventures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adventures.is_empty()
    }
}

impl AdventureCatalog for JsonAdventureCatalog {
    fn get_adventure_by_id(&self, id: AdventureId) -> Option<Arc<Adventure>> {
        self.adventures.iter().find(|a| a.id == id).cloned()
    }

    fn list(&self) -> Vec<Arc<Adventure>> {
        self.adventures.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": 7,
            "title": "Test Dungeon",
            "description": "Short and dark",
            "min_players": 2,
            "max_players": 3,
            "map": { "areas": {
                "a_gate": { "name": "Gate", "description": "Iron", "connections": ["b_hall", "nowhere"] },
                "b_hall": { "name": "Hall", "description": "Stone", "connections": [] },
                "c_pit": { "name": "Pit", "description": "Deep", "connections": ["b_hall"] }
            } }
        },
        { "id": 8, "title": "Missing fields" }
    ]"#;

    #[test]
    fn test_from_json_builds_symmetric_map_and_skips_bad_entries() {
        // given (前提条件):
        let catalog = JsonAdventureCatalog::from_json(SAMPLE).unwrap();

        // when (操作):
        let adventure = catalog.get_adventure_by_id(AdventureId(7)).unwrap();

        // then (期待する結果):
        assert_eq!(catalog.len(), 1);
        assert_eq!(adventure.title, "Test Dungeon");
        assert_eq!(adventure.image, None);
        assert_eq!(adventure.map.areas().len(), 3);
        assert_eq!(adventure.map.area(0).unwrap().name, "Gate");
        // gate(0) <-> hall(1), pit(2) <-> hall(1)
        assert_eq!(adventure.map.connected(1), vec![0, 2]);
        assert_eq!(adventure.map.connected(0), vec![1]);
        assert!(catalog.get_adventure_by_id(AdventureId(8)).is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = JsonAdventureCatalog::from_json("{not json");

        assert!(matches!(result, Err(AdventureLoadError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = JsonAdventureCatalog::from_path("/definitely/not/here.json");

        assert!(matches!(result, Err(AdventureLoadError::Io { .. })));
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = JsonAdventureCatalog::builtin().unwrap();

        assert_eq!(catalog.len(), 3);
        let manor = catalog.get_adventure_by_id(AdventureId(1)).unwrap();
        assert_eq!(manor.title, "The Haunted Manor");
        assert!(manor.map.connection_count() > 0);
        assert_eq!(catalog.adventures_for_player_count(6, 6).len(), 1);
    }
}
