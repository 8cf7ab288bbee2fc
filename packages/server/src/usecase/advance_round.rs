//! Round engine: plans and writes the next chapter for every player and closes the round.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RoundEngine::begin() / run() / advance_if_all_chosen()
//!
//! ### なぜこのテストが必要か
//! - ラウンド番号がプレイヤー数に関係なく1回の進行で1だけ増えることを保証する
//! - 生成器の失敗や不正な出力が固定のフォールバック章に置き換わることを保証する
//! - 前回の選択肢のラベルとラウンド計画の方針が正しく生成器に渡ることを確認する
//! - 章の生成中にロビーのロックを保持せず、他の操作が待たされないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員分の章が生成される
//! - 異常系：生成器がエラーを返す、空の章を返す、計画が失敗する
//! - エッジケース：範囲外の選択は "No choice made" として渡される、生成中の退出

use std::sync::Arc;

use futures_util::future::join_all;

use crate::{
    domain::{
        Chapter, ChapterRequest, Connection, ConnectionId, DEFAULT_DIRECTION, Lobby, LobbyId,
        LobbyRepository, NO_CHOICE_MADE, PlayerState, RoundPlanRequest, SharedLobby,
        StoryDirection, StoryGenerator, fallback_chapter, validate_chapter,
    },
    infrastructure::dto::websocket::{NewRoundMessage, RoundInfo, encode},
};

use super::BroadcastService;

/// A claimed round transition: what the generator needs, captured under the
/// lobby lock.
#[derive(Debug)]
pub struct PendingRound {
    round: u32,
    plan: RoundPlanRequest,
    requests: Vec<(ConnectionId, ChapterRequest)>,
}

enum RoundPlan {
    /// The generator has no planning step.
    Unplanned,
    /// Directions by player name; players without one get the default.
    Planned(Vec<StoryDirection>),
}

impl RoundPlan {
    fn direction_for(&self, player_name: &str) -> Option<String> {
        match self {
            RoundPlan::Unplanned => None,
            RoundPlan::Planned(directions) => Some(
                directions
                    .iter()
                    .find(|d| d.player_name == player_name)
                    .map(|d| d.direction.clone())
                    .unwrap_or_else(|| DEFAULT_DIRECTION.to_string()),
            ),
        }
    }
}

/// Advances lobbies from one round to the next.
///
/// The lobby lock is held only to claim a round and to apply its chapters;
/// the generator runs in between without it, so a slow generator never
/// blocks other operations on the lobby or on the registry.
pub struct RoundEngine {
    story_generator: Arc<dyn StoryGenerator>,
    repository: Arc<dyn LobbyRepository>,
    broadcast: Arc<BroadcastService>,
}

impl RoundEngine {
    pub fn new(
        story_generator: Arc<dyn StoryGenerator>,
        repository: Arc<dyn LobbyRepository>,
        broadcast: Arc<BroadcastService>,
    ) -> Self {
        Self {
            story_generator,
            repository,
            broadcast,
        }
    }

    /// Claim the next round transition and snapshot the chapter requests.
    ///
    /// Call with the lobby lock held. Returns `None` when the game has not
    /// started or a transition is already in flight.
    pub fn begin(&self, lobby: &mut Lobby) -> Option<PendingRound> {
        if !lobby.begin_round() {
            return None;
        }
        let round = lobby.game_state.round + 1;
        let lobby: &Lobby = lobby;

        let requests: Vec<(ConnectionId, ChapterRequest)> = lobby
            .connections
            .iter()
            .map(|connection| (connection.id, chapter_request(lobby, connection, round)))
            .collect();
        let plan = RoundPlanRequest {
            adventure: lobby.adventure.clone(),
            round,
            players: requests.iter().map(|(_, request)| player_state(request)).collect(),
        };

        Some(PendingRound {
            round,
            plan,
            requests,
        })
    }

    /// Write a claimed round, apply it, and send each player their `new_round`.
    ///
    /// Players who left while the chapters were written are skipped. Returns
    /// the new round number.
    pub async fn run(&self, lobby_id: &LobbyId, shared: &SharedLobby, pending: PendingRound) -> u32 {
        let chapters = self.write_chapters(pending).await;

        let (round, messages) = {
            let mut lobby = shared.lock().await;
            let messages = apply_round(&mut lobby, chapters);
            (lobby.game_state.round, messages)
        };

        self.broadcast.send_each(lobby_id, messages).await;
        round
    }

    /// Advance the lobby if every current player has answered their chapter.
    ///
    /// Returns the new round number when a transition happened.
    pub async fn advance_if_all_chosen(&self, lobby_id: &LobbyId) -> Option<u32> {
        let shared = self.repository.find_lobby(lobby_id).await.ok()?;
        let pending = {
            let mut lobby = shared.lock().await;
            if !lobby.all_choices_made() {
                return None;
            }
            self.begin(&mut lobby)?
        };
        Some(self.run(lobby_id, &shared, pending).await)
    }

    async fn write_chapters(&self, pending: PendingRound) -> Vec<(ConnectionId, Chapter)> {
        tracing::debug!(
            "Writing round {} for {} players",
            pending.round,
            pending.requests.len()
        );
        let plan = self.plan(pending.plan).await;

        join_all(pending.requests.into_iter().map(|(id, mut request)| {
            request.direction = plan.direction_for(&request.player_name);
            async move { (id, self.generate(request).await) }
        }))
        .await
    }

    /// A failed plan still gives every player the default direction.
    async fn plan(&self, request: RoundPlanRequest) -> RoundPlan {
        let round = request.round;
        match self.story_generator.plan_round(request).await {
            Ok(directions) if directions.is_empty() => RoundPlan::Unplanned,
            Ok(directions) => RoundPlan::Planned(directions),
            Err(e) => {
                tracing::warn!("Using default directions for round {}: {}", round, e);
                RoundPlan::Planned(Vec::new())
            }
        }
    }

    /// Ask the generator for a chapter, substituting the fallback chapter when
    /// it fails or returns something unusable.
    async fn generate(&self, request: ChapterRequest) -> Chapter {
        let player = request.player_name.clone();
        match self
            .story_generator
            .generate_chapter(request)
            .await
            .and_then(validate_chapter)
        {
            Ok(chapter) => chapter,
            Err(e) => {
                tracing::warn!("Using fallback chapter for '{}': {}", player, e);
                fallback_chapter()
            }
        }
    }
}

/// Append the chapters of players still present, bump the round once, and
/// encode each player's `new_round`.
fn apply_round(
    lobby: &mut Lobby,
    chapters: Vec<(ConnectionId, Chapter)>,
) -> Vec<(ConnectionId, String)> {
    let chapters: Vec<(ConnectionId, Chapter)> = chapters
        .into_iter()
        .filter(|(id, _)| lobby.connection(id).is_some())
        .collect();

    for (id, chapter) in &chapters {
        lobby.append_chapter(*id, chapter.clone());
    }
    let round = lobby.complete_round();
    tracing::info!(
        "Lobby '{}' advanced to round {} ({} players)",
        lobby.id,
        round,
        chapters.len()
    );

    chapters
        .into_iter()
        .map(|(id, chapter)| {
            let message = NewRoundMessage::new(RoundInfo::from_chapter(round, &chapter));
            (id, encode(&message))
        })
        .collect()
}

fn chapter_request(lobby: &Lobby, connection: &Connection, round: u32) -> ChapterRequest {
    let previous_chapters = lobby.game_state.chapters(&connection.id).to_vec();
    let last_choice = previous_chapters
        .last()
        .map(|chapter| chapter.chosen_label().unwrap_or(NO_CHOICE_MADE).to_string());

    ChapterRequest {
        player_name: connection.story_name().to_string(),
        adventure: lobby.adventure.clone(),
        direction: None,
        previous_chapters,
        last_choice,
        round,
    }
}

fn player_state(request: &ChapterRequest) -> PlayerState {
    PlayerState {
        player_name: request.player_name.clone(),
        last_chapter: request.previous_chapter().map(|c| c.text().to_string()),
        last_choice: request.last_choice.clone(),
    }
}
