//! Shared utilities for projex.
//!
//! This crate provides common utilities used across the projex workspace:
//! - Root containment checks (`PathGuard`)
//! - Timestamp-derived run identifiers
//! - Logging setup with tracing
//! - RAII-based timing for operation measurement

pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use id::RunId;
pub use path::{PathEscapeError, PathGuard};
pub use timing::TimingGuard;
