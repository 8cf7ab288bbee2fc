//! UseCase: ロビー参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinLobbyUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 定員を超えた参加が拒否され、接続一覧が切り詰められないことを保証する
//! - 拒否された参加者が MessagePusher に残らないことを保証する
//! - 参加成功時に全員へロビー情報が配信されることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加してロビー情報を受け取る
//! - 異常系：存在しないロビー、満員のロビー、開始済みのロビー

use std::sync::Arc;

use taleweave_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, LobbyError, LobbyId, LobbyRepository, MessagePusher, PusherChannel,
    Timestamp,
};

use super::BroadcastService;

/// ロビー参加のユースケース
pub struct JoinLobbyUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcast: Arc<BroadcastService>,
    clock: Arc<dyn Clock>,
}

impl JoinLobbyUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcast: Arc<BroadcastService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            broadcast,
            clock,
        }
    }

    /// ロビー参加を実行
    ///
    /// The outbound channel is registered before the connection becomes
    /// visible in the lobby, so a concurrent broadcast can always reach it.
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 追加された接続（表示名が割り当て済み）
    /// * `Err(LobbyError)` - `LobbyNotFound` / `LobbyFull` / `AlreadyStarted`
    pub async fn execute(
        &self,
        lobby_id: &LobbyId,
        sender: PusherChannel,
    ) -> Result<Connection, LobbyError> {
        let shared = self.repository.find_lobby(lobby_id).await?;
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_client(connection_id, sender)
            .await;

        let joined = {
            let mut lobby = shared.lock().await;
            lobby
                .add_connection(connection_id, Timestamp::new(self.clock.now_millis()))
                .cloned()
        };

        match joined {
            Ok(connection) => {
                tracing::info!(
                    "{} ('{}') joined lobby '{}'",
                    connection.name,
                    connection.id,
                    lobby_id
                );
                self.broadcast.broadcast_lobby_info(lobby_id).await;
                Ok(connection)
            }
            Err(e) => {
                self.message_pusher.unregister_client(&connection_id).await;
                tracing::warn!("Join to lobby '{}' rejected: {}", lobby_id, e);
                Err(e)
            }
        }
    }
}
