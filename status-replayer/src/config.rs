use status_config::load_config;
use status_config::shared::ReplayerConfig;

/// Loads the [`ReplayerConfig`] and validates it.
pub fn load_replayer_config() -> anyhow::Result<ReplayerConfig> {
    let config = load_config::<ReplayerConfig>()?;
    config.validate()?;

    Ok(config)
}
