use crate::config::load_replayer_config;
use crate::core::start_replayer_with_config;
use status_config::shared::ReplayerConfig;
use status_telemetry::init_tracing_with_connection;
use tracing::error;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    // Load replayer config
    let replayer_config = load_replayer_config()?;

    // Tag logs with the connection when replaying a single one
    let connection_id = replayer_config
        .replay
        .single_connection_id()
        .map(str::to_string);
    let _log_flusher = init_tracing_with_connection(env!("CARGO_BIN_NAME"), connection_id)?;

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(replayer_config))?;

    Ok(())
}

async fn async_main(replayer_config: ReplayerConfig) -> anyhow::Result<()> {
    // We start the replayer and catch any errors.
    if let Err(err) = start_replayer_with_config(replayer_config).await {
        error!("an error occurred in the replayer: {err}");

        return Err(err);
    }

    Ok(())
}
