//! Lobby aggregate: a bounded group of connections sharing one adventure.

use std::{collections::HashMap, sync::Arc};

use super::{
    Adventure, Chapter, Connection, ConnectionId, LobbyError, LobbyId, PlayerName, Timestamp,
};

/// Round progression and per-player chapter history.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub started: bool,
    /// Incremented once per completed round transition.
    pub round: u32,
    /// A round transition has been claimed and its chapters are being written.
    advancing: bool,
    chapters: HashMap<ConnectionId, Vec<Chapter>>,
}

impl GameState {
    pub fn is_advancing(&self) -> bool {
        self.advancing
    }

    pub fn chapters(&self, id: &ConnectionId) -> &[Chapter] {
        self.chapters.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn latest_chapter(&self, id: &ConnectionId) -> Option<&Chapter> {
        self.chapters.get(id).and_then(|chapters| chapters.last())
    }

    fn latest_chapter_mut(&mut self, id: &ConnectionId) -> Option<&mut Chapter> {
        self.chapters.get_mut(id).and_then(|chapters| chapters.last_mut())
    }

    fn append_chapter(&mut self, id: ConnectionId, chapter: Chapter) {
        self.chapters.entry(id).or_default().push(chapter);
    }
}

/// A lobby and everything its players share.
///
/// All mutation goes through `&mut self`; the registry keeps each lobby behind
/// its own mutex so operations on one lobby are serialized.
#[derive(Debug, Clone)]
pub struct Lobby {
    pub id: LobbyId,
    pub max_players: usize,
    pub adventure: Arc<Adventure>,
    /// Join order, which is also the order players are listed in.
    pub connections: Vec<Connection>,
    pub game_state: GameState,
    pub created_at: Timestamp,
    closed: bool,
}

impl Lobby {
    pub fn new(
        id: LobbyId,
        max_players: usize,
        adventure: Arc<Adventure>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            max_players,
            adventure,
            connections: Vec::new(),
            game_state: GameState::default(),
            created_at,
            closed: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.connections.len() >= self.max_players
    }

    /// A lobby is closed once its last connection left. Closed lobbies are
    /// about to be dropped from the registry and accept no one.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    fn connection_mut(&mut self, id: &ConnectionId) -> Result<&mut Connection, LobbyError> {
        self.connections
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or(LobbyError::ConnectionNotFound(*id))
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|c| c.id).collect()
    }

    /// Lowest "Player N" not currently taken, so names freed by leaving
    /// players get reused.
    pub fn next_player_name(&self) -> PlayerName {
        let mut number = 1;
        while self
            .connections
            .iter()
            .any(|c| c.name.number() == Some(number))
        {
            number += 1;
        }
        PlayerName::numbered(number)
    }

    /// Add a new connection at the end of the join order.
    pub fn add_connection(
        &mut self,
        id: ConnectionId,
        joined_at: Timestamp,
    ) -> Result<&Connection, LobbyError> {
        if self.closed {
            return Err(LobbyError::LobbyNotFound(self.id.to_string()));
        }
        if self.game_state.started {
            return Err(LobbyError::AlreadyStarted);
        }
        if self.is_full() {
            return Err(LobbyError::LobbyFull(self.id.to_string()));
        }

        let name = self.next_player_name();
        self.connections.push(Connection::new(id, name, joined_at));
        Ok(&self.connections[self.connections.len() - 1])
    }

    /// Remove a connection and its chapter history. Returns `None` when the
    /// connection was already gone.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let position = self.connections.iter().position(|c| &c.id == id)?;
        let removed = self.connections.remove(position);
        self.game_state.chapters.remove(id);
        if self.connections.is_empty() {
            self.closed = true;
        }
        Some(removed)
    }

    pub fn toggle_ready(&mut self, id: &ConnectionId) -> Result<bool, LobbyError> {
        Ok(self.connection_mut(id)?.toggle_ready())
    }

    pub fn all_ready(&self) -> bool {
        self.connections.iter().all(|c| c.ready)
    }

    /// Mark the game started and open an empty chapter history per player.
    pub fn start(&mut self) -> Result<(), LobbyError> {
        if self.game_state.started {
            return Err(LobbyError::AlreadyStarted);
        }
        if !self.all_ready() {
            return Err(LobbyError::NotAllReady);
        }

        self.game_state.started = true;
        for connection in &self.connections {
            self.game_state.chapters.insert(connection.id, Vec::new());
        }
        Ok(())
    }

    /// Record a choice on the player's latest chapter.
    ///
    /// Returns `Ok(false)` when the player has no chapter to answer yet.
    pub fn record_choice(&mut self, id: &ConnectionId, index: usize) -> Result<bool, LobbyError> {
        self.connection_mut(id)?;
        match self.game_state.latest_chapter_mut(id) {
            Some(chapter) => {
                chapter.record_choice(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn has_answered(&self, id: &ConnectionId) -> bool {
        self.game_state
            .latest_chapter(id)
            .is_some_and(Chapter::is_answered)
    }

    /// The round barrier: every current player's latest chapter is answered.
    pub fn all_choices_made(&self) -> bool {
        !self.connections.is_empty() && self.connections.iter().all(|c| self.has_answered(&c.id))
    }

    /// Number of players the barrier is still waiting for.
    pub fn pending_choices(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| !self.has_answered(&c.id))
            .count()
    }

    pub fn append_chapter(&mut self, id: ConnectionId, chapter: Chapter) {
        self.game_state.append_chapter(id, chapter);
    }

    /// Claim the next round transition.
    ///
    /// Returns `false` when the game has not started or another transition is
    /// still in flight. The claim is released by [`Lobby::complete_round`].
    pub fn begin_round(&mut self) -> bool {
        if !self.game_state.started || self.game_state.advancing {
            return false;
        }
        self.game_state.advancing = true;
        true
    }

    /// Close the current round and return the new round number.
    pub fn complete_round(&mut self) -> u32 {
        self.game_state.advancing = false;
        self.game_state.round += 1;
        self.game_state.round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdventureId, Map};

    fn test_adventure() -> Arc<Adventure> {
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

    fn test_lobby(max_players: usize) -> Lobby {
        Lobby::new(
            LobbyId::new("abcd1234".to_string()).unwrap(),
            max_players,
            test_adventure(),
            Timestamp::new(0),
        )
    }

    fn join(lobby: &mut Lobby) -> ConnectionId {
        let id = ConnectionId::generate();
        lobby.add_connection(id, Timestamp::new(0)).unwrap();
        id
    }

    fn names(lobby: &Lobby) -> Vec<&str> {
        lobby.connections.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_join_rejects_beyond_capacity() {
        // テスト項目: 定員を超える参加は拒否され、切り詰められない
        // given (前提条件):
        let mut lobby = test_lobby(2);
        join(&mut lobby);
        join(&mut lobby);

        // when (操作):
        let result = lobby.add_connection(ConnectionId::generate(), Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(result, Err(LobbyError::LobbyFull("abcd1234".to_string())));
        assert_eq!(lobby.connections.len(), 2);
    }

    #[test]
    fn test_player_names_reuse_lowest_gap() {
        // テスト項目: 空いた最小の "Player N" が再利用される
        // given (前提条件):
        let mut lobby = test_lobby(4);
        join(&mut lobby);
        let second = join(&mut lobby);
        join(&mut lobby);

        // when (操作):
        lobby.remove_connection(&second);

        // then (期待する結果):
        assert_eq!(names(&lobby), vec!["Player 1", "Player 3"]);

        join(&mut lobby);
        assert_eq!(names(&lobby), vec!["Player 1", "Player 3", "Player 2"]);
    }

    #[test]
    fn test_join_after_start_is_rejected() {
        let mut lobby = test_lobby(4);
        let id = join(&mut lobby);
        lobby.toggle_ready(&id).unwrap();
        lobby.start().unwrap();

        let result = lobby.add_connection(ConnectionId::generate(), Timestamp::new(0));

        assert_eq!(result, Err(LobbyError::AlreadyStarted));
    }

    #[test]
    fn test_removing_last_connection_closes_lobby() {
        let mut lobby = test_lobby(2);
        let id = join(&mut lobby);

        let removed = lobby.remove_connection(&id);

        assert!(removed.is_some());
        assert!(lobby.is_closed());
        assert!(lobby.remove_connection(&id).is_none());
        assert_eq!(
            lobby.add_connection(ConnectionId::generate(), Timestamp::new(0)),
            Err(LobbyError::LobbyNotFound("abcd1234".to_string()))
        );
    }

    #[test]
    fn test_toggle_ready_unknown_connection() {
        let mut lobby = test_lobby(2);
        let stranger = ConnectionId::generate();

        assert_eq!(
            lobby.toggle_ready(&stranger),
            Err(LobbyError::ConnectionNotFound(stranger))
        );
    }

    #[test]
    fn test_start_requires_everyone_ready() {
        // given (前提条件): 2人中1人だけ準備完了
        let mut lobby = test_lobby(2);
        let first = join(&mut lobby);
        let second = join(&mut lobby);
        lobby.toggle_ready(&first).unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(lobby.start(), Err(LobbyError::NotAllReady));
        assert!(!lobby.game_state.started);

        lobby.toggle_ready(&second).unwrap();
        assert_eq!(lobby.start(), Ok(()));
        assert!(lobby.game_state.started);
        assert!(lobby.game_state.chapters(&first).is_empty());
        assert_eq!(lobby.start(), Err(LobbyError::AlreadyStarted));
    }

    #[test]
    fn test_barrier_waits_for_every_player() {
        // テスト項目: 全員が選択するまでバリアは成立しない
        // given (前提条件):
        let mut lobby = test_lobby(3);
        let ids: Vec<_> = (0..3).map(|_| join(&mut lobby)).collect();
        for id in &ids {
            lobby.append_chapter(
                *id,
                Chapter::new("text", vec!["a".to_string(), "b".to_string()]),
            );
        }

        // when (操作):
        lobby.record_choice(&ids[0], 0).unwrap();
        lobby.record_choice(&ids[1], 1).unwrap();

        // then (期待する結果):
        assert!(!lobby.all_choices_made());
        assert_eq!(lobby.pending_choices(), 1);

        lobby.record_choice(&ids[2], 0).unwrap();
        assert!(lobby.all_choices_made());
        assert_eq!(lobby.pending_choices(), 0);
    }

    #[test]
    fn test_record_choice_without_chapter() {
        let mut lobby = test_lobby(1);
        let id = join(&mut lobby);

        assert_eq!(lobby.record_choice(&id, 0), Ok(false));
        assert!(!lobby.all_choices_made());
    }

    #[test]
    fn test_complete_round_increments_once() {
        let mut lobby = test_lobby(1);

        assert_eq!(lobby.complete_round(), 1);
        assert_eq!(lobby.complete_round(), 2);
        assert_eq!(lobby.game_state.round, 2);
    }

    #[test]
    fn test_only_one_round_transition_is_claimed_at_a_time() {
        // テスト項目: 進行中のラウンド遷移がある間は次の遷移を開始できない
        // given (前提条件):
        let mut lobby = test_lobby(2);
        let id = join(&mut lobby);
        assert!(!lobby.begin_round());
        lobby.toggle_ready(&id).unwrap();
        lobby.start().unwrap();

        // when (操作):
        let first = lobby.begin_round();
        let second = lobby.begin_round();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(lobby.game_state.is_advancing());
        assert_eq!(lobby.complete_round(), 1);
        assert!(!lobby.game_state.is_advancing());
        assert!(lobby.begin_round());
    }
}
