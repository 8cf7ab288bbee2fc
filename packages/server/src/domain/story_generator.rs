//! Boundary to the external story generator.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Adventure, Chapter, GeneratorError};

/// Text of the chapter used whenever the generator fails.
pub const FALLBACK_CHAPTER_TEXT: &str = "You continue your adventure through unknown territory...";

/// Choices of the fallback chapter.
pub const FALLBACK_CHOICES: [&str; 3] = ["Continue forward", "Look around", "Go back"];

/// Placeholder for a previous choice that does not resolve to a label.
pub const NO_CHOICE_MADE: &str = "No choice made";

/// Direction given to a player the round plan does not cover.
pub const DEFAULT_DIRECTION: &str = "Continue your adventure with new challenges ahead.";

/// Where one player stands when the next round is planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub player_name: String,
    /// Text of the player's latest chapter, `None` before the first round.
    pub last_chapter: Option<String>,
    pub last_choice: Option<String>,
}

/// Input of the round-level planning step.
#[derive(Debug, Clone)]
pub struct RoundPlanRequest {
    pub adventure: Arc<Adventure>,
    pub round: u32,
    /// Players in join order.
    pub players: Vec<PlayerState>,
}

/// Planned next beat for one player's story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDirection {
    pub player_name: String,
    pub direction: String,
}

/// Everything the generator gets to write one player's next chapter.
#[derive(Debug, Clone)]
pub struct ChapterRequest {
    pub player_name: String,
    pub adventure: Arc<Adventure>,
    /// Planned direction for this chapter, when the generator plans rounds.
    pub direction: Option<String>,
    /// The player's chapters so far, oldest first.
    pub previous_chapters: Vec<Chapter>,
    /// Label of the choice made on the latest chapter. `None` on the first round.
    pub last_choice: Option<String>,
    /// Round the chapter is generated for.
    pub round: u32,
}

impl ChapterRequest {
    pub fn previous_chapter(&self) -> Option<&Chapter> {
        self.previous_chapters.last()
    }
}

/// Produces chapter content. Its output may be slow, fail, or be malformed;
/// callers validate it and fall back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Plan the round for all players at once so their stories stay connected.
    ///
    /// Generators without a planning step return no directions, and every
    /// chapter request then goes out without one.
    async fn plan_round(
        &self,
        _request: RoundPlanRequest,
    ) -> Result<Vec<StoryDirection>, GeneratorError> {
        Ok(Vec::new())
    }

    async fn generate_chapter(&self, request: ChapterRequest) -> Result<Chapter, GeneratorError>;
}

/// Chapter substituted for failed or invalid generator output.
pub fn fallback_chapter() -> Chapter {
    Chapter::new(
        FALLBACK_CHAPTER_TEXT,
        FALLBACK_CHOICES.iter().map(|c| c.to_string()).collect(),
    )
}

/// Check that a generated chapter has text and at least one usable choice.
pub fn validate_chapter(chapter: Chapter) -> Result<Chapter, GeneratorError> {
    if chapter.text().trim().is_empty() {
        return Err(GeneratorError::InvalidResponse(
            "chapter text is empty".to_string(),
        ));
    }
    if chapter.choices().is_empty() {
        return Err(GeneratorError::InvalidResponse(
            "chapter has no choices".to_string(),
        ));
    }
    if chapter.choices().iter().any(|c| c.trim().is_empty()) {
        return Err(GeneratorError::InvalidResponse(
            "chapter has a blank choice".to_string(),
        ));
    }
    Ok(chapter)
}
