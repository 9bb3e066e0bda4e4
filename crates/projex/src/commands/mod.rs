//! Command handlers for the projex CLI.

pub mod apply;
pub mod export;
pub mod logging;
pub mod serve;

pub use apply::*;
pub use export::*;
pub use logging::*;
pub use serve::*;
