//! Apply command.

use anyhow::Context;
use projex_patch::{MutationOperation, PatchExecutor};
use projex_util::path::expand_home;
use std::io::Read;
use std::path::Path;

/// Read operations from `input` (a file, or `-` for stdin) and apply them to `root`.
pub async fn handle_apply(root: &Path, input: &str) -> anyhow::Result<()> {
    let text = if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read operations from stdin")?;
        text
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {input}"))?
    };

    let operations: Vec<MutationOperation> =
        serde_json::from_str(&text).context("Operations must be a JSON array")?;

    let executor = PatchExecutor::new(expand_home(&root.to_string_lossy()))?;
    match executor.apply(&operations).await {
        Ok(outcomes) => {
            for outcome in outcomes {
                println!("{outcome}");
            }
            Ok(())
        }
        Err(failure) => {
            for outcome in &failure.applied {
                println!("{outcome}");
            }
            Err(failure.error).context(format!(
                "Stopped after {} of {} operations",
                failure.applied.len(),
                operations.len()
            ))
        }
    }
}
