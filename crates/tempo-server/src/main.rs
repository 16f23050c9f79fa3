//! Tempo server entry point.
//!
//! Loads configuration, installs logging, connects the key-value store,
//! and serves the API until `Ctrl-C`.

use std::sync::Arc;

use tempo_planner::Planner;
use tempo_server::avatar::AvatarClient;
use tempo_server::config::{LogFormat, LoggingConfig};
use tempo_server::state::connect_store;
use tempo_server::{start_server, AppState, TempoConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store is unreachable,
/// or the listener cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TempoConfig::load()?;
    init_logging(&config.logging);

    info!(
        host = config.server.host,
        port = config.server.port,
        store = ?config.store.backend,
        llm_backend = ?config.llm.backend,
        llm_enabled = config.llm.is_enabled(),
        "tempo-server starting"
    );

    let kv = connect_store(&config.store).await?;
    let planner = Planner::from_config(&config.llm);
    let avatar = AvatarClient::new(config.avatar.clone());
    if !avatar.is_enabled() {
        info!("no avatar API key configured, voice conversations disabled");
    }

    let state = Arc::new(AppState::new(&kv, planner, avatar, config.server.keepalive()));
    start_server(&config.server, state).await?;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
