//! Serve command.

use projex_core::Config;
use projex_server::AppState;
use tracing::info;

/// Run the HTTP server.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let address = config.server_address();
    let state = AppState::from_config(config).await?;
    info!(
        address = %address,
        storage = %state.exports.store().base_dir().display(),
        cors = state.cors,
        "Starting projex server"
    );

    projex_server::serve(state, &address).await?;
    Ok(())
}
