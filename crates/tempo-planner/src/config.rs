//! LLM backend configuration.
//!
//! Read from the `llm` section of `tempo-config.yaml`; the API key and
//! endpoint can be overridden from the environment so secrets stay out of
//! the file.

use std::time::Duration;

use serde::Deserialize;

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    #[default]
    #[serde(alias = "deepseek", alias = "ollama")]
    OpenAi,
    /// Anthropic Messages API (different request format).
    #[serde(alias = "claude")]
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in `LLM_BACKEND`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Configuration for the planner's LLM backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// The backend API flavor.
    pub backend: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key. Empty disables the backend; every call then falls back.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Deadline for one LLM call, in milliseconds.
    pub timeout_ms: u64,
    /// Optional directory of prompt templates overriding the built-ins.
    pub templates_dir: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_owned(),
            timeout_ms: 15_000,
            templates_dir: None,
        }
    }
}

impl LlmConfig {
    /// Whether a backend should be constructed at all.
    pub const fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The per-call deadline.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Apply `LLM_BACKEND`, `LLM_API_URL`, `LLM_API_KEY`, `LLM_MODEL`
    /// environment overrides. Unknown backend names are ignored with a
    /// warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("LLM_BACKEND") {
            match BackendType::parse(&raw) {
                Some(backend) => self.backend = backend,
                None => tracing::warn!(backend = raw, "unknown LLM_BACKEND, keeping configured backend"),
            }
        }
        if let Ok(url) = std::env::var("LLM_API_URL") {
            self.api_url = url;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.api_key = key;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.model = model;
        }
    }
}
