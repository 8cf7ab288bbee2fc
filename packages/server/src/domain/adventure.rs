//! Read-only adventure reference data.
//!
//! Adventures are loaded once at start-up and shared between lobbies behind
//! an `Arc` without locking; nothing in the core mutates them afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::AdventureId;

/// Identifier of an area within one map.
pub type AreaId = usize;

/// A place on an adventure map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub description: String,
}

impl Area {
    pub fn new(id: AreaId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Set of areas plus an undirected adjacency relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    areas: Vec<Area>,
    connections: BTreeMap<AreaId, BTreeSet<AreaId>>,
}

impl Map {
    pub fn new(areas: Vec<Area>) -> Self {
        Self {
            areas,
            connections: BTreeMap::new(),
        }
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.iter().find(|area| area.id == id)
    }

    /// Connect two areas in both directions.
    pub fn add_connection(&mut self, a: AreaId, b: AreaId) {
        self.connections.entry(a).or_default().insert(b);
        self.connections.entry(b).or_default().insert(a);
    }

    /// Remove the connection between two areas in both directions.
    pub fn remove_connection(&mut self, a: AreaId, b: AreaId) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(neighbours) = self.connections.get_mut(&from) {
                neighbours.remove(&to);
                if neighbours.is_empty() {
                    self.connections.remove(&from);
                }
            }
        }
    }

    /// Areas directly reachable from `id`, in ascending id order.
    pub fn connected(&self, id: AreaId) -> Vec<AreaId> {
        self.connections
            .get(&id)
            .map(|neighbours| neighbours.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_connected(&self, a: AreaId, b: AreaId) -> bool {
        self.connections
            .get(&a)
            .is_some_and(|neighbours| neighbours.contains(&b))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

/// One playable story with its player bounds and map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adventure {
    pub id: AdventureId,
    pub title: String,
    pub description: String,
    pub min_players: usize,
    pub max_players: usize,
    pub image: Option<String>,
    pub map: Map,
}

impl Adventure {
    /// Whether the adventure supports some player count in `min..=max`.
    pub fn supports_player_range(&self, min: usize, max: usize) -> bool {
        min <= self.max_players && max >= self.min_players
    }
}
