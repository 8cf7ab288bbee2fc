//! Boundary to the static adventure definitions.

use std::sync::Arc;

use super::{Adventure, AdventureId};

/// Read-only access to loaded adventures.
pub trait AdventureCatalog: Send + Sync {
    fn get_adventure_by_id(&self, id: AdventureId) -> Option<Arc<Adventure>>;

    /// Every adventure, in catalog order.
    fn list(&self) -> Vec<Arc<Adventure>>;

    /// Adventures whose player bounds overlap `min..=max`.
    fn adventures_for_player_count(&self, min: usize, max: usize) -> Vec<Arc<Adventure>> {
        self.list()
            .into_iter()
            .filter(|adventure| adventure.supports_player_range(min, max))
            .collect()
    }
}
