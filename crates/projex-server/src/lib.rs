//! HTTP server for projex.
//!
//! Exposes export runs, artifact downloads, prompt building and patch
//! application as a JSON API under `/api`.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use tracing::info;

/// Bind `address` and serve the API until Ctrl-C.
pub async fn serve(state: AppState, address: &str) -> std::io::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down server");
        })
        .await
}
