//! UseCase: ロビー退出処理

use std::sync::Arc;

use crate::domain::{ConnectionId, LobbyId};

use super::{BroadcastService, RoundEngine};

/// ロビー退出のユースケース
///
/// 接続の切断時に呼ばれる。ロビーや接続が既に無い場合は何もしない。
pub struct LeaveLobbyUseCase {
    broadcast: Arc<BroadcastService>,
    round_engine: Arc<RoundEngine>,
}

impl LeaveLobbyUseCase {
    pub fn new(broadcast: Arc<BroadcastService>, round_engine: Arc<RoundEngine>) -> Self {
        Self {
            broadcast,
            round_engine,
        }
    }

    /// ロビー退出を実行
    ///
    /// Returns whether the connection was still in the lobby. Remaining
    /// members receive the updated lobby info; an emptied lobby is removed.
    /// If the leaver was the last player the round was waiting for, the
    /// round advances for everyone left.
    pub async fn execute(&self, lobby_id: &LobbyId, connection_id: ConnectionId) -> bool {
        let removed = self.broadcast.disconnect(lobby_id, connection_id).await;
        if removed {
            if let Some(round) = self.round_engine.advance_if_all_chosen(lobby_id).await {
                tracing::info!(
                    "Lobby '{}' advanced to round {} after '{}' left",
                    lobby_id,
                    round,
                    connection_id
                );
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::LobbyRepository,
        usecase::test_support::{Harness, mock_generator},
    };

    fn create_usecase(harness: &Harness) -> LeaveLobbyUseCase {
        LeaveLobbyUseCase::new(
            harness.broadcast.clone(),
            Arc::new(harness.round_engine(mock_generator())),
        )
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        // given (前提条件):
        let harness = Harness::new();
        let lobby_id = harness.create_lobby(3).await;
        let (first, _first_rx) = harness.join(&lobby_id).await;
        let (_, mut second_rx) = harness.join(&lobby_id).await;
        let usecase = create_usecase(&harness);

        // when (操作):
        let left = usecase.execute(&lobby_id, first).await;

        // then (期待する結果):
        assert!(left);
        let info = Harness::next_json(&mut second_rx).await;
        assert_eq!(info["lobby"]["current_players"], 1);
        assert_eq!(info["lobby"]["players"][0]["name"], "Player 2");
    }

    #[tokio::test]
    async fn test_leave_last_member_removes_lobby() {
        // テスト項目: 1人だけのロビーから退出すると、以降の取得は LobbyNotFound になる
        let harness = Harness::new();
        let lobby_id = harness.create_lobby(2).await;
        let (only, _rx) = harness.join(&lobby_id).await;
        let usecase = create_usecase(&harness);

        usecase.execute(&lobby_id, only).await;

        assert_eq!(
            harness.repository.get_lobby(&lobby_id).await.map(|l| l.id),
            Err(crate::domain::LobbyError::LobbyNotFound(lobby_id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_leave_twice_is_a_noop() {
        let harness = Harness::new();
        let lobby_id = harness.create_lobby(2).await;
        let (first, _first_rx) = harness.join(&lobby_id).await;
        let (_, _second_rx) = harness.join(&lobby_id).await;
        let usecase = create_usecase(&harness);

        assert!(usecase.execute(&lobby_id, first).await);
        assert!(!usecase.execute(&lobby_id, first).await);

        let lobby = harness.repository.get_lobby(&lobby_id).await.unwrap();
        assert_eq!(lobby.connections.len(), 1);
    }
}
