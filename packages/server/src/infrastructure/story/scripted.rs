//! Offline story generator.
//!
//! Walks the adventure map: each chapter places the player in an area and
//! offers the neighbouring areas as choices. Used when no language model is
//! configured, and as a predictable generator in tests.

use async_trait::async_trait;

use crate::domain::{
    Area, Chapter, ChapterRequest, GeneratorError, NO_CHOICE_MADE, StoryGenerator,
};

/// Choice appended to every scripted chapter.
const SEARCH_CHOICE: &str = "Search the area carefully";

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedStoryGenerator;

impl ScriptedStoryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Area the player is in for this request.
    ///
    /// Picking a "Head to X" choice moves the player to X; otherwise the
    /// position is derived from the round so players spread over the map.
    fn current_area<'a>(&self, request: &'a ChapterRequest) -> Option<&'a Area> {
        let map = &request.adventure.map;
        let chosen = request
            .last_choice
            .as_deref()
            .and_then(|label| label.strip_prefix("Head to "))
            .and_then(|name| map.areas().iter().find(|area| area.name == name));

        chosen.or_else(|| {
            let areas = map.areas();
            if areas.is_empty() {
                return None;
            }
            let seed = request.player_name.len() + request.round as usize;
            areas.get(seed % areas.len())
        })
    }
}

#[async_trait]
impl StoryGenerator for ScriptedStoryGenerator {
    async fn generate_chapter(&self, request: ChapterRequest) -> Result<Chapter, GeneratorError> {
        let adventure = &request.adventure;
        let Some(area) = self.current_area(&request) else {
            return Err(GeneratorError::Unavailable(format!(
                "adventure '{}' has no areas to narrate",
                adventure.title
            )));
        };

        let opening = match request.last_choice.as_deref() {
            Some(choice) if choice != NO_CHOICE_MADE => {
                format!("{} decided to {}.", request.player_name, lowercase_first(choice))
            }
            _ if request.previous_chapters.is_empty() => format!(
                "{} sets out on {}.",
                request.player_name, adventure.title
            ),
            _ => format!("{} hesitates, then presses on.", request.player_name),
        };
        let text = format!(
            "{} Round {} finds them in the {}. {}",
            opening, request.round, area.name, area.description
        );

        let mut choices: Vec<String> = adventure
            .map
            .connected(area.id)
            .into_iter()
            .filter_map(|id| adventure.map.area(id))
            .take(2)
            .map(|neighbour| format!("Head to {}", neighbour.name))
            .collect();
        choices.push(SEARCH_CHOICE.to_string());

        Ok(Chapter::new(text, choices))
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
