//! Shared fixtures for use case tests.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    domain::{
        Adventure, AdventureId, Area, ConnectionId, LobbyId, LobbyRepository, Map, MessagePusher,
        MockStoryGenerator, StoryGenerator, Timestamp,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryLobbyRepository,
    },
};

use super::{BroadcastService, RoundEngine};

/// Capacity of test client channels.
const CHANNEL_CAPACITY: usize = 32;

pub fn test_adventure() -> Arc<Adventure> {
    let mut map = Map::new(vec![
        Area::new(0, "Harbor", "Creaking piers and gulls."),
        Area::new(1, "Jungle", "Thick vines hide old ruins."),
        Area::new(2, "Volcano", "The ground is warm."),
    ]);
    map.add_connection(0, 1);
    map.add_connection(1, 2);
    Arc::new(Adventure {
        id: AdventureId(3),
        title: "The Lost Treasure of the Dragon Isles".to_string(),
        description: "Gold, fog and dragons.".to_string(),
        min_players: 1,
        max_players: 5,
        image: None,
        map,
    })
}

/// Mock generator without a planning step; tests add chapter expectations.
pub fn mock_generator() -> MockStoryGenerator {
    let mut generator = MockStoryGenerator::new();
    generator.expect_plan_round().returning(|_| Ok(Vec::new()));
    generator
}

/// Real registry and pusher wired together, with clients backed by channels.
pub struct Harness {
    pub repository: Arc<InMemoryLobbyRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub broadcast: Arc<BroadcastService>,
}

impl Harness {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryLobbyRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let broadcast = Arc::new(BroadcastService::new(repository.clone(), pusher.clone()));
        Self {
            repository,
            pusher,
            broadcast,
        }
    }

    pub async fn create_lobby(&self, max_players: usize) -> LobbyId {
        self.repository
            .create_lobby(max_players, test_adventure(), Timestamp::new(0))
            .await
    }

    /// Add a member directly, without announcing it.
    pub async fn join(&self, lobby_id: &LobbyId) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let id = ConnectionId::generate();
        self.pusher.register_client(id, tx).await;
        let shared = self.repository.find_lobby(lobby_id).await.unwrap();
        shared
            .lock()
            .await
            .add_connection(id, Timestamp::new(0))
            .unwrap();
        (id, rx)
    }

    pub fn round_engine(&self, generator: impl StoryGenerator + 'static) -> RoundEngine {
        RoundEngine::new(
            Arc::new(generator),
            self.repository.clone(),
            self.broadcast.clone(),
        )
    }

    /// Lobby with `players` ready members and a started game, before round 1.
    pub async fn started_lobby(
        &self,
        players: usize,
    ) -> (LobbyId, Vec<(ConnectionId, mpsc::Receiver<String>)>) {
        let lobby_id = self.create_lobby(players).await;
        let mut members = Vec::with_capacity(players);
        for _ in 0..players {
            members.push(self.join(&lobby_id).await);
        }
        self.ready_all(&lobby_id).await;
        let shared = self.repository.find_lobby(&lobby_id).await.unwrap();
        shared.lock().await.start().unwrap();
        (lobby_id, members)
    }

    /// Mark every member ready.
    pub async fn ready_all(&self, lobby_id: &LobbyId) {
        let shared = self.repository.find_lobby(lobby_id).await.unwrap();
        let mut lobby = shared.lock().await;
        for id in lobby.connection_ids() {
            lobby.toggle_ready(&id).unwrap();
        }
    }

    pub async fn next_json(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
        let message = rx.recv().await.expect("channel closed");
        serde_json::from_str(&message).unwrap()
    }

    /// Drain everything already queued and return it parsed.
    pub fn drain_json(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(serde_json::from_str(&message).unwrap());
        }
        messages
    }

    /// Drain the queue and keep only messages of one type.
    pub fn drain_of_type(rx: &mut mpsc::Receiver<String>, kind: &str) -> Vec<serde_json::Value> {
        Self::drain_json(rx)
            .into_iter()
            .filter(|m| m["type"] == kind)
            .collect()
    }
}
