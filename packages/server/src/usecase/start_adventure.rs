//! UseCase: アドベンチャー開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartAdventureUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 全員が準備完了でなければ開始できないことを保証する
//! - 開始時に全員が start_adventure と1ラウンド目の new_round を受け取ることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員準備完了で開始
//! - 異常系：準備未完了の参加者がいる、既に開始済み

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, LobbyError, LobbyId, LobbyRepository},
    infrastructure::dto::websocket::{StartAdventureMessage, encode},
};

use super::{BroadcastService, RoundEngine};

/// アドベンチャー開始のユースケース
pub struct StartAdventureUseCase {
    repository: Arc<dyn LobbyRepository>,
    round_engine: Arc<RoundEngine>,
    broadcast: Arc<BroadcastService>,
}

impl StartAdventureUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        round_engine: Arc<RoundEngine>,
        broadcast: Arc<BroadcastService>,
    ) -> Self {
        Self {
            repository,
            round_engine,
            broadcast,
        }
    }

    /// アドベンチャー開始を実行
    ///
    /// Starting and claiming the first round happen under one lobby lock.
    /// Every player is told the game started before the first chapters are
    /// written, which happens without the lock.
    ///
    /// # Returns
    ///
    /// * `Ok(u32)` - 開始後のラウンド番号
    /// * `Err(LobbyError)` - `AlreadyStarted` / `NotAllReady` / `ConnectionNotFound`
    pub async fn execute(
        &self,
        lobby_id: &LobbyId,
        connection_id: ConnectionId,
    ) -> Result<u32, LobbyError> {
        let shared = self.repository.find_lobby(lobby_id).await?;

        let (members, pending) = {
            let mut lobby = shared.lock().await;
            if lobby.connection(&connection_id).is_none() {
                return Err(LobbyError::ConnectionNotFound(connection_id));
            }
            lobby.start()?;
            tracing::info!(
                "Adventure '{}' started in lobby '{}' by '{}'",
                lobby.adventure.title,
                lobby_id,
                connection_id
            );

            let pending = self
                .round_engine
                .begin(&mut lobby)
                .ok_or(LobbyError::AlreadyStarted)?;
            (lobby.connection_ids(), pending)
        };

        let started = encode(&StartAdventureMessage::success());
        self.broadcast
            .send_each(
                lobby_id,
                members.into_iter().map(|id| (id, started.clone())).collect(),
            )
            .await;
        let round = self.round_engine.run(lobby_id, &shared, pending).await;
        self.broadcast.broadcast_lobby_info(lobby_id).await;

        Ok(round)
    }
}
