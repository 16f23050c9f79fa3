//! Error types for the planner.
//!
//! These never escape the [`Planner`](crate::Planner) facade: every
//! variant is logged and replaced by a fallback value there.

/// Errors that can occur while planning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The LLM stopped before finishing its reply (token limit, content
    /// filter, refusal).
    #[error("LLM reply incomplete: {0}")]
    Incomplete(String),

    /// The LLM did not answer within the configured deadline.
    #[error("timeout: LLM call exceeded {0} ms")]
    Timeout(u128),

    /// No LLM backend is configured.
    #[error("no LLM backend configured")]
    Disabled,

    /// Failed to render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// The LLM response could not be parsed.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
