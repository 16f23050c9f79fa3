//! Client for the voice-avatar conversation API.
//!
//! The avatar service runs the live conversation; this side only creates
//! it, passing the user's current schedule as context and the tool
//! definitions the avatar may call back into.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempo_types::{ConversationId, UserProfile};

use crate::config::AvatarConfig;
use crate::tools::tool_definitions;

/// Errors from the avatar API.
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// No API key is configured.
    #[error("avatar service is not configured")]
    Disabled,

    /// The request could not be sent or timed out.
    #[error("avatar request failed: {0}")]
    Request(String),

    /// The service answered with an error status or an unexpected body.
    #[error("avatar service error: {0}")]
    Upstream(String),
}

/// A conversation created on the avatar service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Identifier used in tool callbacks.
    pub conversation_id: ConversationId,
    /// URL the browser joins.
    pub conversation_url: String,
}

/// HTTP client for the avatar API.
#[derive(Debug, Clone)]
pub struct AvatarClient {
    client: reqwest::Client,
    config: AvatarConfig,
}

impl AvatarClient {
    /// Create a client from configuration.
    pub fn new(config: AvatarConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build avatar HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { client, config }
    }

    /// Whether conversations can be created at all.
    pub const fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Start a conversation for `profile` with `schedule_context` (a
    /// plain-text rendering of today's schedule).
    pub async fn create_conversation(
        &self,
        profile: &UserProfile,
        schedule_context: &str,
    ) -> Result<Conversation, AvatarError> {
        if !self.is_enabled() {
            return Err(AvatarError::Disabled);
        }
        let url = format!("{}/conversations", self.config.api_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "replica_id": self.config.replica_id,
            "persona_id": self.config.persona_id,
            "callback_url": self.config.callback_url,
            "conversation_name": format!("Tempo planning with {}", profile.display_name),
            "conversational_context": conversational_context(profile, schedule_context),
            "custom_greeting": format!("Hi {}! Want to go over your day?", profile.display_name),
            "tools": tool_definitions(),
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AvatarError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(AvatarError::Upstream(format!("{status}: {error_body}")));
        }

        response
            .json::<Conversation>()
            .await
            .map_err(|e| AvatarError::Upstream(format!("unexpected response: {e}")))
    }
}

fn conversational_context(profile: &UserProfile, schedule_context: &str) -> String {
    let mut context = format!(
        "You are a friendly scheduling assistant for {}. Use the tools to read and change \
         their calendar; never invent events.\n",
        profile.display_name
    );
    if !profile.non_negotiables.is_empty() {
        context.push_str(&format!(
            "They never skip: {}.\n",
            profile.non_negotiables.join(", ")
        ));
    }
    context.push_str(schedule_context);
    context
}
