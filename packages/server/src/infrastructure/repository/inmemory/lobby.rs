//! In-memory lobby registry.
//!
//! Implements the domain's `LobbyRepository` with a `HashMap` from lobby id to
//! a per-lobby mutex. State is lost on restart.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Adventure, Lobby, LobbyError, LobbyId, LobbyIdFactory, LobbyRepository, SharedLobby,
    Timestamp,
};

/// In-memory lobby registry.
///
/// The map lock is only held for lookups and inserts/removals; it is released
/// before any lobby lock is awaited, so a lobby busy with a slow round advance
/// never stalls lobby creation or lookups elsewhere.
#[derive(Default)]
pub struct InMemoryLobbyRepository {
    lobbies: Mutex<HashMap<LobbyId, SharedLobby>>,
}

impl InMemoryLobbyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, lobby_id: &LobbyId) -> Result<SharedLobby, LobbyError> {
        let lobbies = self.lobbies.lock().await;
        lobbies
            .get(lobby_id)
            .cloned()
            .ok_or_else(|| LobbyError::LobbyNotFound(lobby_id.to_string()))
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn create_lobby(
        &self,
        max_players: usize,
        adventure: Arc<Adventure>,
        created_at: Timestamp,
    ) -> LobbyId {
        let mut lobbies = self.lobbies.lock().await;

        let mut lobby_id = LobbyIdFactory::generate();
        while lobbies.contains_key(&lobby_id) {
            tracing::debug!("Lobby id '{}' already taken, regenerating", lobby_id);
            lobby_id = LobbyIdFactory::generate();
        }

        let lobby = Lobby::new(lobby_id.clone(), max_players, adventure, created_at);
        lobbies.insert(lobby_id.clone(), Arc::new(Mutex::new(lobby)));
        lobby_id
    }

    async fn find_lobby(&self, lobby_id: &LobbyId) -> Result<SharedLobby, LobbyError> {
        self.handle(lobby_id).await
    }

    async fn get_lobby(&self, lobby_id: &LobbyId) -> Result<Lobby, LobbyError> {
        let shared = self.handle(lobby_id).await?;
        let lobby = shared.lock().await;
        if lobby.is_closed() {
            return Err(LobbyError::LobbyNotFound(lobby_id.to_string()));
        }
        Ok(lobby.clone())
    }

    async fn remove_if_empty(&self, lobby_id: &LobbyId) -> bool {
        let Ok(shared) = self.handle(lobby_id).await else {
            return false;
        };

        // Closing is terminal, so the check stays valid after the lock is released.
        if !shared.lock().await.is_closed() {
            return false;
        }

        let mut lobbies = self.lobbies.lock().await;
        match lobbies.get(lobby_id) {
            Some(current) if Arc::ptr_eq(current, &shared) => {
                lobbies.remove(lobby_id);
                true
            }
            _ => false,
        }
    }

    async fn list_all(&self) -> Vec<Lobby> {
        let handles: Vec<SharedLobby> = {
            let lobbies = self.lobbies.lock().await;
            lobbies.values().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            let lobby = handle.lock().await;
            if !lobby.is_closed() {
                snapshots.push(lobby.clone());
            }
        }
        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        snapshots
    }

    async fn count_lobbies(&self) -> usize {
        self.lobbies.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdventureId, ConnectionId, Map};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryLobbyRepository の作成・取得・削除・一覧
    // - 空になったロビーだけが remove_if_empty で削除されること
    // - スナップショットがライブな状態と切り離されていること
    // ========================================

    fn adventure() -> Arc<Adventure> {
        Arc::new(Adventure {
            id: AdventureId(1),
            title: "The Lost Treasure".to_string(),
            description: "A hunt for gold".to_string(),
            min_players: 1,
            max_players: 4,
            image: None,
            map: Map::default(),
        })
    }

    #[tokio::test]
    async fn test_create_and_get_lobby() {
        // given (前提条件):
        let repo = InMemoryLobbyRepository::new();

        // when (操作):
        let lobby_id = repo.create_lobby(4, adventure(), Timestamp::new(10)).await;

        // then (期待する結果):
        let lobby = repo.get_lobby(&lobby_id).await.unwrap();
        assert_eq!(lobby.id, lobby_id);
        assert_eq!(lobby.max_players, 4);
        assert_eq!(lobby.adventure.title, "The Lost Treasure");
        assert_eq!(repo.count_lobbies().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_lobby_fails() {
        let repo = InMemoryLobbyRepository::new();
        let unknown = LobbyId::new("nonexistent".to_string()).unwrap();

        let result = repo.get_lobby(&unknown).await;

        assert_eq!(
            result.map(|l| l.id),
            Err(LobbyError::LobbyNotFound("nonexistent".to_string()))
        );
    }

    #[tokio::test]
    async fn test_created_ids_are_unique() {
        let repo = InMemoryLobbyRepository::new();

        let mut ids = Vec::new();
        for _ in 0..50 {
            ids.push(repo.create_lobby(2, adventure(), Timestamp::new(0)).await);
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();

        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_remove_if_empty_only_removes_closed_lobbies() {
        // テスト項目: 最後の参加者が抜けたロビーだけが削除される
        // given (前提条件):
        let repo = InMemoryLobbyRepository::new();
        let lobby_id = repo.create_lobby(2, adventure(), Timestamp::new(0)).await;
        let member = ConnectionId::generate();
        {
            let shared = repo.find_lobby(&lobby_id).await.unwrap();
            shared
                .lock()
                .await
                .add_connection(member, Timestamp::new(0))
                .unwrap();
        }

        // when (操作): まだ参加者がいる
        assert!(!repo.remove_if_empty(&lobby_id).await);

        // 最後の参加者が抜ける
        {
            let shared = repo.find_lobby(&lobby_id).await.unwrap();
            shared.lock().await.remove_connection(&member);
        }

        // then (期待する結果):
        assert!(repo.remove_if_empty(&lobby_id).await);
        assert!(repo.get_lobby(&lobby_id).await.is_err());
        assert!(!repo.remove_if_empty(&lobby_id).await);
        assert_eq!(repo.count_lobbies().await, 0);
    }

    #[tokio::test]
    async fn test_list_all_returns_detached_snapshots_oldest_first() {
        let repo = InMemoryLobbyRepository::new();
        let newer = repo.create_lobby(2, adventure(), Timestamp::new(200)).await;
        let older = repo.create_lobby(3, adventure(), Timestamp::new(100)).await;

        let mut snapshots = repo.list_all().await;
        snapshots[0].max_players = 99;

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, older);
        assert_eq!(snapshots[1].id, newer);
        assert_eq!(repo.get_lobby(&older).await.unwrap().max_players, 3);
    }
}
