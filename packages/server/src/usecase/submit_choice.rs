//! UseCase: 選択肢の送信とラウンドの同期
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitChoiceUseCase::execute() メソッド
//! - 全員が選択するまでラウンドが進まないこと（ラウンドのバリア）
//!
//! ### なぜこのテストが必要か
//! - 3人中2人の選択ではラウンドが進まず、3人目で1回だけ進むことを保証する
//! - 各参加者が new_round をちょうど1通受け取ることを保証する
//! - 古い接続からの遅れた選択でエンジンが落ちないことを保証する
//! - 未選択の最後の1人が退出した場合もラウンドが止まらないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員の選択でラウンドが進む
//! - 異常系：存在しないロビー・接続からの選択、負の選択番号
//! - エッジケース：同じ章への再選択（後勝ち）、範囲外の選択番号、章の生成中の選択

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, LobbyId, LobbyRepository},
    infrastructure::dto::websocket::{ChoiceRecordedMessage, encode},
};

use super::{BroadcastService, RoundEngine};

/// Result of a submitted choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The submission could not be applied and was dropped.
    Ignored,
    /// Recorded; the round is still waiting for this many players.
    Recorded { waiting_for: usize },
    /// Recorded, and it completed the round.
    RoundAdvanced { round: u32 },
}

/// 選択肢送信のユースケース
pub struct SubmitChoiceUseCase {
    repository: Arc<dyn LobbyRepository>,
    round_engine: Arc<RoundEngine>,
    broadcast: Arc<BroadcastService>,
}

impl SubmitChoiceUseCase {
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

    /// 選択を記録し、全員の選択が揃っていればラウンドを進める
    ///
    /// Never fails: an unknown lobby or connection, a negative index, a
    /// player without a chapter, or a choice arriving while the next round is
    /// being written is logged and reported as [`ChoiceOutcome::Ignored`].
    pub async fn execute(
        &self,
        lobby_id: &LobbyId,
        connection_id: ConnectionId,
        choice_index: i64,
    ) -> ChoiceOutcome {
        let Ok(index) = usize::try_from(choice_index) else {
            tracing::warn!(
                "Ignoring negative choice {} from '{}'",
                choice_index,
                connection_id
            );
            return ChoiceOutcome::Ignored;
        };

        let shared = match self.repository.find_lobby(lobby_id).await {
            Ok(shared) => shared,
            Err(e) => {
                tracing::warn!("Ignoring choice from '{}': {}", connection_id, e);
                return ChoiceOutcome::Ignored;
            }
        };

        let advanced = {
            let mut lobby = shared.lock().await;
            if lobby.game_state.is_advancing() {
                tracing::debug!(
                    "Ignoring choice from '{}': next round is being written",
                    connection_id
                );
                return ChoiceOutcome::Ignored;
            }
            match lobby.record_choice(&connection_id, index) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(
                        "Ignoring choice from '{}': no chapter to answer yet",
                        connection_id
                    );
                    return ChoiceOutcome::Ignored;
                }
                Err(e) => {
                    tracing::warn!("Ignoring choice in lobby '{}': {}", lobby_id, e);
                    return ChoiceOutcome::Ignored;
                }
            }
            tracing::debug!(
                "Choice {} recorded for '{}' in lobby '{}'",
                index,
                connection_id,
                lobby_id
            );

            if lobby.all_choices_made() {
                self.round_engine
                    .begin(&mut lobby)
                    .ok_or_else(|| lobby.pending_choices())
            } else {
                Err(lobby.pending_choices())
            }
        };

        match advanced {
            Ok(pending) => {
                let round = self.round_engine.run(lobby_id, &shared, pending).await;
                ChoiceOutcome::RoundAdvanced { round }
            }
            Err(waiting_for) => {
                let ack = encode(&ChoiceRecordedMessage::new(index, waiting_for));
                self.broadcast.send_to(lobby_id, connection_id, ack).await;
                ChoiceOutcome::Recorded { waiting_for }
            }
        }
    }
}
