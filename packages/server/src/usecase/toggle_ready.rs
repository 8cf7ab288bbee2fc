//! UseCase: 準備完了状態の切り替え

use std::sync::Arc;

use crate::domain::{ConnectionId, LobbyError, LobbyId, LobbyRepository};

use super::BroadcastService;

/// 準備完了切り替えのユースケース
pub struct ToggleReadyUseCase {
    repository: Arc<dyn LobbyRepository>,
    broadcast: Arc<BroadcastService>,
}

impl ToggleReadyUseCase {
    pub fn new(repository: Arc<dyn LobbyRepository>, broadcast: Arc<BroadcastService>) -> Self {
        Self {
            repository,
            broadcast,
        }
    }

    /// 準備完了状態を反転し、ロビー全員に最新のロビー情報を配信する
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - 反転後の ready の値
    pub async fn execute(
        &self,
        lobby_id: &LobbyId,
        connection_id: ConnectionId,
    ) -> Result<bool, LobbyError> {
        let shared = self.repository.find_lobby(lobby_id).await?;
        let ready = shared.lock().await.toggle_ready(&connection_id)?;
        tracing::debug!(
            "Connection '{}' in lobby '{}' is now {}",
            connection_id,
            lobby_id,
            if ready { "ready" } else { "not ready" }
        );

        self.broadcast.broadcast_lobby_info(lobby_id).await;
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::Harness;

    #[tokio::test]
    async fn test_toggle_ready_flips_and_broadcasts() {
        // given (前提条件):
        let harness = Harness::new();
        let lobby_id = harness.create_lobby(2).await;
        let (first, mut first_rx) = harness.join(&lobby_id).await;
        let (_, mut second_rx) = harness.join(&lobby_id).await;
        let usecase = ToggleReadyUseCase::new(harness.repository.clone(), harness.broadcast.clone());

        // when (操作):
        let ready = usecase.execute(&lobby_id, first).await.unwrap();

        // then (期待する結果):
        assert!(ready);
        for rx in [&mut first_rx, &mut second_rx] {
            let info = Harness::next_json(rx).await;
            assert_eq!(info["lobby"]["players"][0]["is_ready"], true);
            assert_eq!(info["lobby"]["players"][1]["is_ready"], false);
        }

        assert!(!usecase.execute(&lobby_id, first).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_ready_unknown_connection() {
        let harness = Harness::new();
        let lobby_id = harness.create_lobby(2).await;
        let usecase = ToggleReadyUseCase::new(harness.repository.clone(), harness.broadcast.clone());
        let stranger = ConnectionId::generate();

        let result = usecase.execute(&lobby_id, stranger).await;

        assert_eq!(result, Err(LobbyError::ConnectionNotFound(stranger)));
    }
}
