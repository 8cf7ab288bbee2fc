//! Story generator backed by an OpenAI-compatible chat-completions API
//! (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Chapter, ChapterRequest, GeneratorError, RoundPlanRequest, StoryDirection, StoryGenerator,
};

use super::prompt::{
    chapter_prompt, parse_chapter_reply, parse_directions_reply, planning_prompt,
    planning_system_prompt, story_context, system_prompt,
};

/// Default API base URL.
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model.
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-small-3.2-24b-instruct:free";

/// Application name sent in the `X-Title` header.
const APP_NAME: &str = "Taleweave";

/// Chat-completions story generator.
#[derive(Clone)]
pub struct OpenRouterStoryGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterStoryGenerator {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self::with_timeout(base_url, api_key, model, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn message(role: &str, content: String) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content,
    }
}

fn reply_content(response: ChatResponse) -> Result<String, GeneratorError> {
    if let Some(error) = response.error {
        return Err(GeneratorError::RequestFailed(error.message));
    }
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| GeneratorError::InvalidResponse("No choices in LLM response".to_string()))
}

impl OpenRouterStoryGenerator {
    /// Send one chat-completions request and return the reply text.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: 0.8,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_NAME)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeneratorError::RequestFailed(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        reply_content(response)
    }
}

#[async_trait]
impl StoryGenerator for OpenRouterStoryGenerator {
    async fn plan_round(
        &self,
        request: RoundPlanRequest,
    ) -> Result<Vec<StoryDirection>, GeneratorError> {
        tracing::debug!(
            "Planning round {} for {} players with {}",
            request.round,
            request.players.len(),
            self.model
        );

        let reply = self
            .complete(
                vec![
                    message("system", planning_system_prompt()),
                    message("user", planning_prompt(&request)),
                ],
                800,
            )
            .await?;
        parse_directions_reply(&reply)
    }

    async fn generate_chapter(&self, request: ChapterRequest) -> Result<Chapter, GeneratorError> {
        tracing::debug!(
            "Requesting chapter for '{}' (round {}) from {}",
            request.player_name,
            request.round,
            self.model
        );

        let reply = self
            .complete(
                vec![
                    message("system", system_prompt()),
                    message("system", format!("Story context: {}", story_context(&request))),
                    message("user", chapter_prompt(&request.adventure)),
                ],
                600,
            )
            .await?;
        parse_chapter_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_content_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#,
        )
        .unwrap();

        assert_eq!(reply_content(response), Ok("hello".to_string()));
    }

    #[test]
    fn test_reply_content_surfaces_api_error() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"error": {"message": "rate limited"}}"#).unwrap();

        assert_eq!(
            reply_content(response),
            Err(GeneratorError::RequestFailed("rate limited".to_string()))
        );
    }

    #[test]
    fn test_reply_content_without_choices_is_invalid() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();

        assert!(matches!(
            reply_content(response),
            Err(GeneratorError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let generator = OpenRouterStoryGenerator::new("http://localhost:1234/v1/", "key", "m");

        assert_eq!(generator.base_url, "http://localhost:1234/v1");
        assert_eq!(generator.model(), "m");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_failure() {
        // テスト項目: 接続できないエンドポイントは RequestFailed になる
        let generator = OpenRouterStoryGenerator::with_timeout(
            "http://127.0.0.1:9",
            "key",
            "m",
            Duration::from_millis(500),
        );
        let request = ChapterRequest {
            player_name: "Player 1".to_string(),
            adventure: std::sync::Arc::new(crate::domain::Adventure {
                id: crate::domain::AdventureId(1),
                title: "T".to_string(),
                description: "D".to_string(),
                min_players: 1,
                max_players: 1,
                image: None,
                map: crate::domain::Map::default(),
            }),
            direction: None,
            previous_chapters: vec![],
            last_choice: None,
            round: 1,
        };

        let result = generator.generate_chapter(request).await;

        assert!(matches!(result, Err(GeneratorError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_round_planning() {
        let generator = OpenRouterStoryGenerator::with_timeout(
            "http://127.0.0.1:9",
            "key",
            "m",
            Duration::from_millis(500),
        );
        let request = RoundPlanRequest {
            adventure: std::sync::Arc::new(crate::domain::Adventure {
                id: crate::domain::AdventureId(1),
                title: "T".to_string(),
                description: "D".to_string(),
                min_players: 1,
                max_players: 1,
                image: None,
                map: crate::domain::Map::default(),
            }),
            round: 1,
            players: vec![],
        };

        let result = generator.plan_round(request).await;

        assert!(matches!(result, Err(GeneratorError::RequestFailed(_))));
    }
}
