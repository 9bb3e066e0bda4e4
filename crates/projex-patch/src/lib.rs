//! Patch application engine for projex.
//!
//! Applies an ordered list of whole-file mutations to a project root:
//! - `create` and `update` write the full content, creating parent directories
//! - `delete` removes a file or a whole directory, and is skipped when the
//!   path does not exist
//!
//! Every operation path is confined to the root, symbolic links included.
//! Batches are not transactional: a failing operation stops the batch and
//! the earlier ones stay applied.
//!
//! # Example
//!
//! ```no_run
//! use projex_patch::{MutationOperation, PatchExecutor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = PatchExecutor::new("/work/myproj")?;
//! let outcomes = executor
//!     .apply(&[
//!         MutationOperation::create("src/lib.rs", "pub fn hello() {}\n"),
//!         MutationOperation::delete("src/old.rs"),
//!     ])
//!     .await?;
//!
//! for outcome in outcomes {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod executor;
mod guard;
mod operation;

pub use error::{PatchError, PatchFailure, PatchResult};
pub use executor::{apply, PatchExecutor};
pub use guard::normalize_operation_path;
pub use operation::{Action, MutationOperation, MutationOutcome};
