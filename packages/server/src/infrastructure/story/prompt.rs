//! Prompt construction and reply parsing for language-model story generators.

use serde::{Deserialize, de::DeserializeOwned};

use crate::domain::{
    Adventure, Chapter, ChapterRequest, GeneratorError, RoundPlanRequest, StoryDirection,
};

/// Number of choices requested per chapter.
pub const CHOICES_PER_CHAPTER: usize = 3;

/// How many chapters before the previous one are included as history.
const RECENT_HISTORY: usize = 2;

/// System prompt describing the expected reply shape.
pub fn system_prompt() -> String {
    format!(
        "You are a creative storyteller for an interactive adventure game. \
         Generate engaging, immersive narrative content with player choices.\n\
         Return your response as a JSON object with this exact structure:\n\
         {{\"text\": \"The story text for this chapter\", \"choices\": [\"Choice 1\", \"Choice 2\", \"Choice 3\"]}}\n\
         Generate exactly {} meaningful choices that lead to different story paths. \
         Keep the story text engaging but concise (2-4 sentences).",
        CHOICES_PER_CHAPTER
    )
}

/// User prompt asking for the next chapter.
pub fn chapter_prompt(adventure: &Adventure) -> String {
    format!(
        "Generate the next chapter for this {} adventure.\n\
         Create an immersive, atmospheric scene that fits the {} setting.\n\
         Reference specific areas from the adventure map when appropriate, \
         follow the player's last choice, and continue seamlessly from the previous chapter.",
        adventure.title,
        adventure_genre(adventure)
    )
}

/// Context block with the adventure, the player's history and the map.
pub fn story_context(request: &ChapterRequest) -> String {
    let adventure = &request.adventure;
    let mut parts = vec![
        format!("Adventure: {}", adventure.title),
        format!("Setting: {}", adventure.description),
        format!("Player: {}", request.player_name),
        format!("Round: {}", request.round),
    ];
    if let Some(direction) = &request.direction {
        parts.push(format!("Story Direction: {}", direction));
    }

    match request.previous_chapter() {
        Some(previous) => {
            parts.push(String::new());
            parts.push("Previous Chapter:".to_string());
            parts.push(previous.text().to_string());
            parts.push(format!(
                "Player's Last Choice: {}",
                request.last_choice.as_deref().unwrap_or("No choice made yet")
            ));

            let earlier = &request.previous_chapters[..request.previous_chapters.len() - 1];
            let recent = &earlier[earlier.len().saturating_sub(RECENT_HISTORY)..];
            if !recent.is_empty() {
                parts.push(String::new());
                parts.push("Recent Story History:".to_string());
                parts.extend(recent.iter().map(|c| format!("- {}", c.text())));
            }
        }
        None => {
            parts.push(String::new());
            parts.push(
                "This is the beginning of the adventure. The player is starting their journey."
                    .to_string(),
            );
        }
    }

    push_map(&mut parts, adventure);
    parts.join("\n")
}

fn push_map(parts: &mut Vec<String>, adventure: &Adventure) {
    let map = &adventure.map;
    parts.push(String::new());
    parts.push("Available Areas:".to_string());
    parts.extend(
        map.areas()
            .iter()
            .map(|area| format!("- {}: {}", area.name, area.description)),
    );
    parts.push(String::new());
    parts.push("Area Connections:".to_string());
    for area in map.areas() {
        let neighbours: Vec<&str> = map
            .connected(area.id)
            .into_iter()
            .filter_map(|id| map.area(id))
            .map(|a| a.name.as_str())
            .collect();
        if !neighbours.is_empty() {
            parts.push(format!("- {} connects to: {}", area.name, neighbours.join(", ")));
        }
    }
}

/// System prompt of the round planning step.
pub fn planning_system_prompt() -> String {
    "You are a master storyteller and game master. Create engaging, interconnected story \
     directions that build narrative tension while respecting player agency."
        .to_string()
}

/// User prompt asking for one direction per player.
pub fn planning_prompt(request: &RoundPlanRequest) -> String {
    let adventure = &request.adventure;
    let mut parts = vec![
        "Based on the current story state, create a plan for what direction each player's \
         story should go next."
            .to_string(),
        format!("Current round: {}", request.round),
        String::new(),
        "Players and their last actions:".to_string(),
    ];
    for player in &request.players {
        parts.push(format!(
            "- {}: last chapter: {}; chosen action: {}",
            player.player_name,
            player
                .last_chapter
                .as_deref()
                .unwrap_or("Beginning of adventure"),
            player
                .last_choice
                .as_deref()
                .unwrap_or("Starting the adventure"),
        ));
    }
    parts.push(String::new());
    parts.push(format!("Adventure: {}", adventure.title));
    parts.push(adventure.description.clone());
    push_map(&mut parts, adventure);
    parts.push(String::new());
    parts.push(
        "For each player, provide a brief direction (1-2 sentences) for what should happen \
         next in their story. Return only a JSON array with objects containing 'player_name' \
         and 'next_direction' fields. Build on their previous choices and reference specific \
         map areas when relevant."
            .to_string(),
    );
    parts.join("\n")
}

/// Rough genre of an adventure from keywords in its title and description.
pub fn adventure_genre(adventure: &Adventure) -> &'static str {
    let haystack = format!("{} {}", adventure.title, adventure.description).to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| haystack.contains(w));

    if mentions(&["haunted", "ghost", "horror", "dark", "cursed", "evil"]) {
        "horror/mystery"
    } else if mentions(&["space", "starship", "alien", "sci-fi", "future"]) {
        "science fiction"
    } else if mentions(&["fantasy", "magic", "dragon", "wizard", "medieval"]) {
        "fantasy"
    } else {
        "adventure"
    }
}

#[derive(Debug, Deserialize)]
struct ChapterReply {
    text: String,
    choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionReply {
    player_name: String,
    next_direction: String,
}

/// Parse a model reply into a chapter.
///
/// Accepts bare JSON, JSON inside a fenced code block, or JSON embedded in
/// surrounding prose.
pub fn parse_chapter_reply(content: &str) -> Result<Chapter, GeneratorError> {
    let reply: ChapterReply = parse_json_reply(content, '{', '}', "chapter")?;
    Ok(Chapter::new(reply.text, reply.choices))
}

/// Parse a planning reply into per-player directions.
pub fn parse_directions_reply(content: &str) -> Result<Vec<StoryDirection>, GeneratorError> {
    let replies: Vec<DirectionReply> = parse_json_reply(content, '[', ']', "directions")?;
    Ok(replies
        .into_iter()
        .map(|reply| StoryDirection {
            player_name: reply.player_name,
            direction: reply.next_direction,
        })
        .collect())
}

fn parse_json_reply<T: DeserializeOwned>(
    content: &str,
    open: char,
    close: char,
    what: &str,
) -> Result<T, GeneratorError> {
    let content = content.trim();

    let candidates = std::iter::once(content)
        .chain(fenced_blocks(content))
        .chain(outermost(content, open, close));

    for candidate in candidates {
        if let Ok(reply) = serde_json::from_str::<T>(candidate.trim()) {
            return Ok(reply);
        }
    }

    Err(GeneratorError::InvalidResponse(format!(
        "no {} JSON found in reply ({} chars)",
        what,
        content.len()
    )))
}

/// Bodies of ``` fenced blocks, with an optional language tag dropped.
fn fenced_blocks(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("```")
        .skip(1)
        .step_by(2)
        .map(|block| match block.split_once('\n') {
            Some((tag, body)) if !tag.trim_start().starts_with(['{', '[']) => body,
            _ => block,
        })
}

fn outermost(content: &str, open: char, close: char) -> Option<&str> {
    let start = content.find(open)?;
    let end = content.rfind(close)?;
    (start < end).then(|| &content[start..=end])
}
