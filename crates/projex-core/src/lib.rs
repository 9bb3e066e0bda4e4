//! Core logic for projex.
//!
//! This crate ties the engines to the outside world:
//! - Configuration management (multi-source, JSONC support)
//! - Export runs that snapshot a directory or an upload into the artifact store
//! - Prompt payloads that ask a model for patch operations

pub mod config;
pub mod error;
pub mod export;
pub mod prompt;

pub use config::{Config, ServerConfig};
pub use error::{ConfigError, CoreError, CoreResult};
pub use export::{ExportService, ExportSummary, UploadedFile};
pub use prompt::{OperationSchema, PromptPayload, PromptRequest};
