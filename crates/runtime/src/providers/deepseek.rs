//! DeepSeek chat-completions client (OpenAI-compatible API).
//!
//! One client serves all three provider ports. Requests are bounded by
//! per-port timeouts; the quest-narrative port retries with exponential
//! backoff and jitter, the parser does not retry. Without an API key the
//! client is simply not constructed and callers stay on their fallbacks.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use world_core::Intent;

use super::{
    CONFIDENCE_FLOOR, GameContext, IntentParser, NARRATIVE_MAX_ATTEMPTS, NARRATIVE_TIMEOUT_SECS,
    NarrationError, Narrator, PARSER_TIMEOUT_SECS, ParserError, QuestNarrativeProvider,
    intent_from_reply,
};

/// Default DeepSeek API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const PARSER_SYSTEM_PROMPT: &str = "You turn player utterances into JSON intents for a text \
     roguelike. Reply with only a JSON object of the shape \
     {\"primaryAction\":{\"action\":string,\"target\"?:string,\"dir\"?:string},\
     \"secondaryActions\"?:[...],\"compound\":bool,\"confidence\":number}.";

const NARRATOR_SYSTEM_PROMPT: &str = "You are the narrator of a text roguelike. Given a scene \
     payload in JSON, reply with two or three sentences of second-person prose. Never invent \
     items, exits, or characters absent from the payload.";

const QUEST_SYSTEM_PROMPT: &str = "You write quest narratives under hard constraints. Reply with \
     only a JSON object containing narrative, objective_description, reward_description, \
     protagonist, antagonist, and steps (matching the given step ids). Respect the forbidden \
     keyword list and mention no other enemy kinds and no other gold amount.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for DeepSeek's OpenAI-compatible chat API.
#[derive(Clone)]
pub struct DeepSeekClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl DeepSeekClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from `DEEPSEEK_API_KEY`; `None` when unset, which
    /// keeps the whole system on its deterministic fallbacks.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("DEEPSEEK_BASE_URL") {
            client.base_url = base_url.trim_end_matches('/').to_string();
        }
        Some(client)
    }

    async fn chat(
        &self,
        system: &str,
        user: String,
        timeout: Duration,
    ) -> Result<String, NarrationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrationError::LlmUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(NarrationError::LlmUnavailable(format!("status {status}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::BadReply(e.to_string()))?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NarrationError::BadReply("no choices".to_string()))
    }
}

/// Strips optional markdown fencing and parses the reply as JSON.
fn parse_json_reply(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(inner.trim()).ok()
}

#[async_trait]
impl IntentParser for DeepSeekClient {
    async fn normalize(&self, text: &str, ctx: &GameContext) -> Result<Intent, ParserError> {
        if text.trim().is_empty() {
            return Err(ParserError::EmptyInput);
        }
        let payload = serde_json::json!({ "utterance": text, "context": ctx });
        let raw = self
            .chat(
                PARSER_SYSTEM_PROMPT,
                payload.to_string(),
                Duration::from_secs(PARSER_TIMEOUT_SECS),
            )
            .await
            .map_err(|e| ParserError::LlmUnavailable(e.to_string()))?;

        let reply =
            parse_json_reply(&raw).ok_or_else(|| ParserError::ParseFailed(raw.clone()))?;
        let intent = intent_from_reply(&reply)?;
        if intent.confidence < CONFIDENCE_FLOOR {
            return Err(ParserError::LowConfidence(intent.confidence));
        }
        Ok(intent)
    }
}

#[async_trait]
impl Narrator for DeepSeekClient {
    async fn narrate(&self, scene: &Value) -> Result<String, NarrationError> {
        let text = self
            .chat(
                NARRATOR_SYSTEM_PROMPT,
                scene.to_string(),
                Duration::from_secs(PARSER_TIMEOUT_SECS),
            )
            .await?;
        if text.trim().is_empty() {
            return Err(NarrationError::BadReply("empty narration".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl QuestNarrativeProvider for DeepSeekClient {
    async fn generate(&self, request: &Value) -> Result<Value, NarrationError> {
        let mut last_error = NarrationError::LlmUnavailable("no attempt made".to_string());

        for attempt in 1..=NARRATIVE_MAX_ATTEMPTS {
            match self
                .chat(
                    QUEST_SYSTEM_PROMPT,
                    request.to_string(),
                    Duration::from_secs(NARRATIVE_TIMEOUT_SECS),
                )
                .await
            {
                Ok(raw) => match parse_json_reply(&raw) {
                    Some(value) => return Ok(value),
                    None => last_error = NarrationError::BadReply(raw),
                },
                Err(e) => last_error = e,
            }

            if attempt < NARRATIVE_MAX_ATTEMPTS {
                let base = 500u64 * 2u64.pow(attempt - 1);
                let jitter = rand::thread_rng().gen_range(0..=base / 4);
                warn!(attempt, delay_ms = base + jitter, "quest narrative retry");
                tokio::time::sleep(Duration::from_millis(base + jitter)).await;
            }
        }
        Err(last_error)
    }
}
