//! Configuration loading for the Tempo server.
//!
//! The canonical configuration lives in `tempo-config.yaml` (or the path in
//! `TEMPO_CONFIG`). Every section is optional; a missing file yields the
//! defaults. Secrets and deployment endpoints can be overridden from the
//! environment.

use std::path::Path;

use serde::Deserialize;
use tempo_planner::LlmConfig;

use crate::server::ServerConfig;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "tempo-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration. Mirrors `tempo-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TempoConfig {
    /// HTTP listener and stream settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Key-value store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// LLM backend used by the planner.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Voice-avatar API settings.
    #[serde(default)]
    pub avatar: AvatarConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TempoConfig {
    /// Load from `TEMPO_CONFIG` or [`DEFAULT_CONFIG_PATH`]. A missing file
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TEMPO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let path = Path::new(&path);
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("TEMPO_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = port, "ignoring invalid TEMPO_PORT"),
            }
        }
        if let Ok(url) = std::env::var("DRAGONFLY_URL") {
            self.store.backend = StoreBackend::Dragonfly;
            self.store.dragonfly_url = url;
        }
        if let Ok(key) = std::env::var("AVATAR_API_KEY") {
            self.avatar.api_key = key;
        }
        self.llm.apply_env_overrides();
    }
}

/// Which key-value backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// A `Dragonfly` (or Redis) server.
    #[default]
    Dragonfly,
    /// In-process store; data is lost on restart.
    Memory,
}

/// Key-value store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: StoreBackend,
    /// `Dragonfly` connection URL.
    pub dragonfly_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Dragonfly,
            dragonfly_url: "redis://localhost:6379".to_owned(),
        }
    }
}

/// Voice-avatar API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Base URL of the avatar API.
    pub api_url: String,
    /// API key. Empty disables conversation creation.
    pub api_key: String,
    /// Avatar replica to render.
    pub replica_id: String,
    /// Persona (voice, behavior) to use.
    pub persona_id: String,
    /// URL the avatar service calls with tool invocations.
    pub callback_url: Option<String>,
    /// Deadline for one avatar API call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            api_url: "https://tavusapi.com/v2".to_owned(),
            api_key: String::new(),
            replica_id: String::new(),
            persona_id: String::new(),
            callback_url: None,
            timeout_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let yaml = r"
server:
  host: 127.0.0.1
  port: 9000
  keepalive_secs: 5
store:
  backend: memory
llm:
  backend: anthropic
  model: claude-3-5-haiku-latest
  timeout_ms: 8000
avatar:
  replica_id: r-1
  persona_id: p-1
logging:
  format: json
";
        let config = TempoConfig::parse(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.keepalive_secs, 5);
        assert_eq!(config.llm.backend, tempo_planner::BackendType::Anthropic);
        assert_eq!(config.llm.timeout_ms, 8000);
        assert_eq!(config.avatar.replica_id, "r-1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = TempoConfig::parse("").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.avatar.timeout_ms, 10_000);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            TempoConfig::parse("server: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
