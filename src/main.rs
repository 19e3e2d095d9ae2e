mod app;
mod config;
mod logic;
mod models;
mod mvu;
mod ui;

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::logic::posting::PostingClient;

fn main() -> anyhow::Result<()> {
    let config_path = Config::default_path();
    let mut config = Config::load(&config_path)?;
    let overrides = config.apply_env_overrides();
    config.validate().context("invalid configuration")?;

    // Loading notes are logged once the subscriber exists.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config_path.exists() {
        tracing::debug!(path = %config_path.display(), "config loaded");
    } else {
        tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
    }
    for note in overrides {
        tracing::info!("{note}");
    }

    tracing::info!(
        base_url = %config.server.base_url,
        board = %config.post.board,
        "starting post composer"
    );

    let client = PostingClient::new(&config.server)?;
    app::run(config, client).map_err(|err| anyhow!("UI error: {err}"))
}
