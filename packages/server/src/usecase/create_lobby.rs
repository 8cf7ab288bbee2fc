//! UseCase: ロビー作成処理

use std::sync::Arc;

use taleweave_shared::time::Clock;

use crate::domain::{AdventureCatalog, AdventureId, LobbyError, LobbyId, LobbyRepository, Timestamp};

/// ロビー作成のユースケース
pub struct CreateLobbyUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn LobbyRepository>,
    /// AdventureCatalog（アドベンチャー定義の取得）
    catalog: Arc<dyn AdventureCatalog>,
    clock: Arc<dyn Clock>,
}

impl CreateLobbyUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        catalog: Arc<dyn AdventureCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            catalog,
            clock,
        }
    }

    /// ロビー作成を実行
    ///
    /// # Returns
    ///
    /// * `Ok(LobbyId)` - 作成されたロビーの ID
    /// * `Err(LobbyError::InvalidCapacity)` - `max_players` が 1 未満
    /// * `Err(LobbyError::AdventureNotFound)` - アドベンチャーが存在しない
    pub async fn execute(
        &self,
        max_players: i64,
        adventure_id: AdventureId,
    ) -> Result<LobbyId, LobbyError> {
        let capacity = usize::try_from(max_players)
            .ok()
            .filter(|capacity| *capacity >= 1)
            .ok_or(LobbyError::InvalidCapacity(max_players))?;

        let adventure = self
            .catalog
            .get_adventure_by_id(adventure_id)
            .ok_or(LobbyError::AdventureNotFound(adventure_id))?;

        let title = adventure.title.clone();
        let lobby_id = self
            .repository
            .create_lobby(capacity, adventure, Timestamp::new(self.clock.now_millis()))
            .await;

        tracing::info!(
            "Lobby '{}' created with adventure '{}' (ID: {}) and max {} players",
            lobby_id,
            title,
            adventure_id,
            capacity
        );
        Ok(lobby_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Adventure, infrastructure::repository::InMemoryLobbyRepository,
        usecase::test_support::test_adventure,
    };
    use taleweave_shared::time::FixedClock;

    struct SingleAdventureCatalog(Arc<Adventure>);

    impl AdventureCatalog for SingleAdventureCatalog {
        fn get_adventure_by_id(&self, id: AdventureId) -> Option<Arc<Adventure>> {
            (self.0.id == id).then(|| self.0.clone())
        }

        fn list(&self) -> Vec<Arc<Adventure>> {
            vec![self.0.clone()]
        }
    }

    fn create_usecase() -> (CreateLobbyUseCase, Arc<InMemoryLobbyRepository>) {
        let repository = Arc::new(InMemoryLobbyRepository::new());
        let usecase = CreateLobbyUseCase::new(
            repository.clone(),
            Arc::new(SingleAdventureCatalog(test_adventure())),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        );
        (usecase, repository)
    }

    #[tokio::test]
    async fn test_create_lobby_success() {
        // given (前提条件):
        let (usecase, repository) = create_usecase();

        // when (操作):
        let lobby_id = usecase.execute(3, AdventureId(3)).await.unwrap();

        // then (期待する結果):
        let lobby = repository.get_lobby(&lobby_id).await.unwrap();
        assert_eq!(lobby.max_players, 3);
        assert_eq!(lobby.adventure.id, AdventureId(3));
        assert_eq!(lobby.created_at.value(), 1_700_000_000_000);
        assert!(lobby.connections.is_empty());
    }

    #[tokio::test]
    async fn test_create_lobby_rejects_capacity_below_one() {
        let (usecase, repository) = create_usecase();

        assert_eq!(
            usecase.execute(0, AdventureId(3)).await,
            Err(LobbyError::InvalidCapacity(0))
        );
        assert_eq!(
            usecase.execute(-2, AdventureId(3)).await,
            Err(LobbyError::InvalidCapacity(-2))
        );
        assert_eq!(repository.count_lobbies().await, 0);
    }

    #[tokio::test]
    async fn test_create_lobby_unknown_adventure() {
        let (usecase, _) = create_usecase();

        let result = usecase.execute(2, AdventureId(99)).await;

        assert_eq!(result, Err(LobbyError::AdventureNotFound(AdventureId(99))));
    }
}
