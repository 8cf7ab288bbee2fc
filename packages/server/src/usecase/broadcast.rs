//! Broadcast service: fan-out of outbound messages to the members of a lobby.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastService の broadcast / send_each / disconnect
//!
//! ### なぜこのテストが必要か
//! - 1人への送信失敗が他の参加者への配信を止めないことを保証する
//! - 送信に失敗した参加者がロビーからちょうど1回だけ取り除かれることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員への配信
//! - 異常系：受信側が閉じた参加者を含む配信
//! - エッジケース：最後の1人が抜けてロビーが削除される場合

use std::sync::Arc;

use futures_util::future::join_all;

use crate::{
    domain::{ConnectionId, LobbyId, LobbyRepository, MessagePusher},
    infrastructure::dto::websocket::{LobbyInfo, LobbyInfoMessage, encode},
};

/// Delivers messages to lobby members and removes members whose delivery fails.
///
/// A failed send is a value inspected per recipient; it never aborts delivery
/// to the others. Recipients are always taken from a snapshot, so removing a
/// member never re-enters a fan-out that is still iterating.
pub struct BroadcastService {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastService {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Send `message` to every member of the lobby except `exclude`.
    ///
    /// No-op if the lobby no longer exists.
    pub async fn broadcast(&self, lobby_id: &LobbyId, message: &str, exclude: Option<ConnectionId>) {
        let Ok(lobby) = self.repository.get_lobby(lobby_id).await else {
            tracing::debug!("Skipping broadcast to missing lobby '{}'", lobby_id);
            return;
        };

        let deliveries = lobby
            .connection_ids()
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .map(|id| (id, message.to_string()))
            .collect();

        self.send_each(lobby_id, deliveries).await;
    }

    /// Send the current lobby view to every member.
    pub async fn broadcast_lobby_info(&self, lobby_id: &LobbyId) {
        let failed = self.push_lobby_info(lobby_id).await;
        self.evict(lobby_id, failed).await;
    }

    /// Send one message to one member.
    pub async fn send_to(&self, lobby_id: &LobbyId, connection_id: ConnectionId, message: String) {
        self.send_each(lobby_id, vec![(connection_id, message)]).await;
    }

    /// Send a distinct message to each listed member.
    pub async fn send_each(&self, lobby_id: &LobbyId, deliveries: Vec<(ConnectionId, String)>) {
        let failed = self.deliver(deliveries).await;
        self.evict(lobby_id, failed).await;
    }

    /// Remove a member, then tell the rest of the lobby.
    ///
    /// Returns whether the member was still in the lobby. Safe to call for a
    /// member or lobby that is already gone.
    pub async fn disconnect(&self, lobby_id: &LobbyId, connection_id: ConnectionId) -> bool {
        let removed = self.remove_member(lobby_id, &connection_id).await;
        if removed {
            self.broadcast_lobby_info(lobby_id).await;
        }
        removed
    }

    /// Push every delivery concurrently and return the recipients that failed.
    async fn deliver(&self, deliveries: Vec<(ConnectionId, String)>) -> Vec<ConnectionId> {
        let results = join_all(deliveries.iter().map(|(id, message)| async move {
            (*id, self.message_pusher.push_to(id, message).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Delivery to '{}' failed: {}", id, e);
                    Some(id)
                }
            })
            .collect()
    }

    /// Serialize the lobby view and push it to every member. Returns the
    /// recipients that failed; empty when the lobby is gone.
    async fn push_lobby_info(&self, lobby_id: &LobbyId) -> Vec<ConnectionId> {
        let Ok(lobby) = self.repository.get_lobby(lobby_id).await else {
            return Vec::new();
        };

        let message = encode(&LobbyInfoMessage::new(LobbyInfo::from(&lobby)));
        let deliveries = lobby
            .connection_ids()
            .into_iter()
            .map(|id| (id, message.clone()))
            .collect();
        self.deliver(deliveries).await
    }

    /// Remove failed recipients and announce the new lobby state, repeating
    /// while the announcement itself produces failures.
    async fn evict(&self, lobby_id: &LobbyId, mut failed: Vec<ConnectionId>) {
        while !failed.is_empty() {
            let mut removed_any = false;
            for connection_id in failed.drain(..) {
                removed_any |= self.remove_member(lobby_id, &connection_id).await;
            }
            if !removed_any {
                break;
            }
            failed = self.push_lobby_info(lobby_id).await;
        }
    }

    /// Remove a member from the lobby and the pusher, dropping the lobby when
    /// it becomes empty.
    async fn remove_member(&self, lobby_id: &LobbyId, connection_id: &ConnectionId) -> bool {
        let removed = match self.repository.find_lobby(lobby_id).await {
            Ok(shared) => {
                let mut lobby = shared.lock().await;
                lobby.remove_connection(connection_id)
            }
            Err(_) => None,
        };
        self.message_pusher.unregister_client(connection_id).await;

        let Some(connection) = removed else {
            return false;
        };
        tracing::info!(
            "{} ('{}') left lobby '{}'",
            connection.name,
            connection_id,
            lobby_id
        );

        if self.repository.remove_if_empty(lobby_id).await {
            tracing::info!("Lobby '{}' is empty and was removed", lobby_id);
        }
        true
    }
}
