//! UseCase: アドベンチャー定義の取得

use std::sync::Arc;

use crate::domain::{Adventure, AdventureCatalog, AdventureId, LobbyError};

/// アドベンチャー一覧・詳細取得のユースケース
pub struct GetAdventuresUseCase {
    catalog: Arc<dyn AdventureCatalog>,
}

impl GetAdventuresUseCase {
    pub fn new(catalog: Arc<dyn AdventureCatalog>) -> Self {
        Self { catalog }
    }

    /// 全アドベンチャー、またはプレイヤー数の範囲に合うものだけを返す
    ///
    /// A missing bound is open on that side.
    pub fn list(
        &self,
        min_players: Option<usize>,
        max_players: Option<usize>,
    ) -> Vec<Arc<Adventure>> {
        match (min_players, max_players) {
            (None, None) => self.catalog.list(),
            (min, max) => self
                .catalog
                .adventures_for_player_count(min.unwrap_or(0), max.unwrap_or(usize::MAX)),
        }
    }

    pub fn detail(&self, adventure_id: AdventureId) -> Result<Arc<Adventure>, LobbyError> {
        self.catalog
            .get_adventure_by_id(adventure_id)
            .ok_or(LobbyError::AdventureNotFound(adventure_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adventure::JsonAdventureCatalog;

    #[test]
    fn test_list_and_detail_from_builtin_catalog() {
        let usecase = GetAdventuresUseCase::new(Arc::new(JsonAdventureCatalog::builtin().unwrap()));

        assert_eq!(usecase.list(None, None).len(), 3);
        assert_eq!(
            usecase.detail(AdventureId(2)).unwrap().title,
            "Derelict Starship Odyssey"
        );
        assert_eq!(
            usecase.detail(AdventureId(42)).map(|a| a.id),
            Err(LobbyError::AdventureNotFound(AdventureId(42)))
        );
    }

    #[test]
    fn test_list_filters_by_player_count() {
        // given (前提条件): 1-4人, 2-6人, 1-5人 の3本
        let usecase = GetAdventuresUseCase::new(Arc::new(JsonAdventureCatalog::builtin().unwrap()));

        // when (操作):
        let six_players = usecase.list(Some(6), Some(6));
        let solo = usecase.list(None, Some(1));

        // then (期待する結果):
        let ids = |list: &[Arc<Adventure>]| list.iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids(&six_players), vec![AdventureId(2)]);
        assert_eq!(ids(&solo), vec![AdventureId(1), AdventureId(3)]);
    }
}
