//! UseCase: ロビー一覧・詳細の取得

use std::sync::Arc;

use crate::domain::{Lobby, LobbyError, LobbyId, LobbyRepository};

/// ロビー一覧取得のユースケース
pub struct GetLobbiesUseCase {
    repository: Arc<dyn LobbyRepository>,
}

impl GetLobbiesUseCase {
    pub fn new(repository: Arc<dyn LobbyRepository>) -> Self {
        Self { repository }
    }

    /// 全ロビーのスナップショットを作成順に返す
    pub async fn execute(&self) -> Vec<Lobby> {
        self.repository.list_all().await
    }
}

/// ロビー詳細取得のユースケース
pub struct GetLobbyDetailUseCase {
    repository: Arc<dyn LobbyRepository>,
}

impl GetLobbyDetailUseCase {
    pub fn new(repository: Arc<dyn LobbyRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, lobby_id: String) -> Result<Lobby, LobbyError> {
        let lobby_id = LobbyId::new(lobby_id)?;
        self.repository.get_lobby(&lobby_id).await
    }
}
