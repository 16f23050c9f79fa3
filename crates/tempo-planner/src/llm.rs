//! Completion calls against the configured LLM provider.
//!
//! Both providers get the same [`RenderedPrompt`] and must answer with a
//! single JSON document. The OpenAI-compatible flavor is asked for JSON
//! mode; the Anthropic flavor has no such switch, so the assistant turn is
//! pre-filled with `{` and the brace is put back on the reply. A reply
//! that stopped for any reason other than a natural end (token limit,
//! content filter) is reported as [`PlannerError::Incomplete`] instead of
//! being handed to the parser half-written.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{BackendType, LlmConfig};
use crate::error::PlannerError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens; a week of events fits comfortably.
const MAX_TOKENS: u32 = 2048;

/// Low temperature keeps replies close to the requested JSON shape.
const TEMPERATURE: f32 = 0.3;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Longest slice of an error body carried into a [`PlannerError`].
const ERROR_BODY_LIMIT: usize = 300;

/// An LLM provider reachable over HTTP.
///
/// Enum dispatch because async methods are not dyn-compatible.
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions.
    OpenAi(Endpoint),
    /// Anthropic Messages API.
    Anthropic(Endpoint),
}

/// Where and as whom to call a provider.
pub struct Endpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Endpoint {
    fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}/{path}", self.base_url))
    }
}

impl LlmBackend {
    /// Send `prompt` and return the reply text, ready for parsing.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, PlannerError> {
        match self {
            Self::OpenAi(endpoint) => {
                let request = endpoint
                    .post("chat/completions")
                    .bearer_auth(&endpoint.api_key);
                let reply: ChatCompletion =
                    send(self.name(), request, &ChatRequest::new(&endpoint.model, prompt)).await?;
                reply.into_text()
            }
            Self::Anthropic(endpoint) => {
                let request = endpoint
                    .post("messages")
                    .header("x-api-key", &endpoint.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION);
                let reply: MessagesReply =
                    send(self.name(), request, &MessagesRequest::new(&endpoint.model, prompt)).await?;
                reply.into_text()
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

impl std::fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let model = match self {
            Self::OpenAi(e) | Self::Anthropic(e) => e.model.as_str(),
        };
        f.debug_struct("LlmBackend")
            .field("provider", &self.name())
            .field("model", &model)
            .finish_non_exhaustive()
    }
}

/// Build the backend the configuration asks for.
pub fn create_backend(config: &LlmConfig) -> LlmBackend {
    let endpoint = Endpoint::new(config);
    match config.backend {
        BackendType::OpenAi => LlmBackend::OpenAi(endpoint),
        BackendType::Anthropic => LlmBackend::Anthropic(endpoint),
    }
}

/// POST `body` as JSON and decode a successful reply as `R`.
async fn send<B, R>(provider: &str, request: reqwest::RequestBuilder, body: &B) -> Result<R, PlannerError>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| PlannerError::LlmBackend(format!("{provider} unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        let detail: String = detail.chars().take(ERROR_BODY_LIMIT).collect();
        return Err(PlannerError::LlmBackend(format!("{provider} returned {status}: {detail}")));
    }

    response
        .json()
        .await
        .map_err(|e| PlannerError::LlmBackend(format!("{provider} sent an unreadable reply: {e}")))
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> ChatRequest<'a> {
    const fn new(model: &'a str, prompt: &'a RenderedPrompt) -> Self {
        Self {
            model,
            messages: [
                Message {
                    role: "system",
                    content: prompt.system.as_str(),
                },
                Message {
                    role: "user",
                    content: prompt.user.as_str(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat { kind: "json_object" },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl ChatCompletion {
    fn into_text(self) -> Result<String, PlannerError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::LlmBackend("reply had no choices".to_owned()))?;
        if let Some(refusal) = choice.message.refusal {
            return Err(PlannerError::Incomplete(format!("refused: {refusal}")));
        }
        match choice.finish_reason.as_deref() {
            None | Some("stop") => {}
            Some(other) => return Err(PlannerError::Incomplete(other.to_owned())),
        }
        choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| PlannerError::LlmBackend("reply had no content".to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Anthropic Messages
// ---------------------------------------------------------------------------

/// Assistant pre-fill that commits the reply to a JSON object.
const JSON_PREFILL: &str = "{";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

impl<'a> MessagesRequest<'a> {
    const fn new(model: &'a str, prompt: &'a RenderedPrompt) -> Self {
        Self {
            model,
            system: prompt.system.as_str(),
            messages: [
                Message {
                    role: "user",
                    content: prompt.user.as_str(),
                },
                Message {
                    role: "assistant",
                    content: JSON_PREFILL,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesReply {
    fn into_text(self) -> Result<String, PlannerError> {
        match self.stop_reason.as_deref() {
            None | Some("end_turn" | "stop_sequence") => {}
            Some(other) => return Err(PlannerError::Incomplete(other.to_owned())),
        }
        let body: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        if body.trim().is_empty() {
            return Err(PlannerError::LlmBackend("reply had no text".to_owned()));
        }
        Ok(format!("{JSON_PREFILL}{body}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn prompt() -> RenderedPrompt {
        RenderedPrompt {
            system: "Reply with JSON.".to_owned(),
            user: "Plan 2026-03-02.".to_owned(),
        }
    }

    #[test]
    fn chat_request_asks_for_json_mode() {
        let prompt = prompt();
        let body = serde_json::to_value(ChatRequest::new("gpt-4o-mini", &prompt)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Plan 2026-03-02.");
        assert_eq!(body["max_tokens"], MAX_TOKENS);
    }

    #[test]
    fn chat_reply_text_is_returned() {
        let reply: ChatCompletion = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "{\"events\": []}"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(reply.into_text().unwrap(), "{\"events\": []}");
    }

    #[test]
    fn truncated_chat_reply_is_incomplete() {
        let reply: ChatCompletion = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "{\"events\": [{\"ti"}, "finish_reason": "length"}]
        }))
        .unwrap();
        assert!(matches!(reply.into_text(), Err(PlannerError::Incomplete(r)) if r == "length"));
    }

    #[test]
    fn empty_chat_reply_is_an_error() {
        let reply: ChatCompletion = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(reply.into_text(), Err(PlannerError::LlmBackend(_))));
    }

    #[test]
    fn messages_request_prefills_the_json_brace() {
        let prompt = prompt();
        let body = serde_json::to_value(MessagesRequest::new("claude", &prompt)).unwrap();
        assert_eq!(body["system"], "Reply with JSON.");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][1]["content"], "{");
    }

    #[test]
    fn messages_reply_restores_prefill() {
        let reply: MessagesReply = serde_json::from_value(serde_json::json!({
            "content": [{"type": "text", "text": "\"action\": \"none\"}"}],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(reply.into_text().unwrap(), "{\"action\": \"none\"}");
    }

    #[test]
    fn messages_reply_hitting_token_limit_is_incomplete() {
        let reply: MessagesReply = serde_json::from_value(serde_json::json!({
            "content": [{"type": "text", "text": "\"events\": ["}],
            "stop_reason": "max_tokens"
        }))
        .unwrap();
        assert!(matches!(reply.into_text(), Err(PlannerError::Incomplete(r)) if r == "max_tokens"));
    }

    #[test]
    fn backend_follows_configured_provider() {
        let mut config = LlmConfig::default();
        assert_eq!(create_backend(&config).name(), "openai-compatible");
        config.backend = BackendType::Anthropic;
        assert_eq!(create_backend(&config).name(), "anthropic");
    }
}
