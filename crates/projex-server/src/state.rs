//! Server state.

use projex_core::{Config, CoreResult, ExportService};
use std::sync::Arc;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Export runs and the artifact store behind downloads.
    pub exports: Arc<ExportService>,
    /// Whether permissive CORS headers are added.
    pub cors: bool,
}

impl AppState {
    pub fn new(exports: ExportService, cors: bool) -> Self {
        Self {
            exports: Arc::new(exports),
            cors,
        }
    }

    /// Build state from configuration, opening the storage directory.
    pub async fn from_config(config: &Config) -> CoreResult<Self> {
        let exports = ExportService::from_config(config).await?;
        Ok(Self::new(exports, config.cors_enabled()))
    }
}
