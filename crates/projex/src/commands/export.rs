//! Export, tree and config commands.

use anyhow::Context;
use projex_core::{Config, ExportService};
use projex_snapshot::{render_export, verify_root, MarkdownDocument, TreeWalker};
use projex_util::path::expand_home;
use std::path::{Path, PathBuf};

/// Export a directory, either into the run store or to an explicit file.
pub async fn handle_export(
    config: &Config,
    path: &Path,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let root = expand_home(&path.to_string_lossy());

    let Some(output) = output else {
        let service = ExportService::from_config(config).await?;
        let summary = service.export_directory(&root).await?;
        println!("Exported {} files", summary.file_count);
        println!("Run:      {}", summary.run_id);
        println!("Document: {}", summary.artifact_path.display());
        return Ok(());
    };

    let snapshot = config.collector().snapshot(&root).await?;
    let mut document = MarkdownDocument::new();
    render_export(&mut document, &snapshot, chrono::Utc::now());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, document.as_str())
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Exported {} files", snapshot.file_count());
    println!("Document: {}", output.display());
    Ok(())
}

/// Print the folder structure of a directory.
pub async fn handle_tree(config: &Config, path: &Path) -> anyhow::Result<()> {
    let root = verify_root(&expand_home(&path.to_string_lossy())).await?;
    let walker = TreeWalker::new(config.excluded());

    let tree = tokio::task::spawn_blocking({
        let root = root.clone();
        move || walker.render_tree(&root)
    })
    .await?;

    println!("{}", root.display());
    if !tree.is_empty() {
        println!("{tree}");
    }
    Ok(())
}

/// Show the merged configuration and where it came from.
pub fn show_config(config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none, using defaults)");
    }
    for source in sources {
        println!("  {}", source.display());
    }
    println!();

    println!("{}", serde_json::to_string_pretty(config)?);
    println!();

    println!("Effective settings:");
    println!("  max_workers:   {}", config.workers());
    println!(
        "  excluded_dirs: {}",
        config.excluded().iter().collect::<Vec<_>>().join(", ")
    );
    match config.storage_path() {
        Ok(path) => println!("  storage_dir:   {}", path.display()),
        Err(e) => println!("  storage_dir:   <{e}>"),
    }
    println!("  server:        {}", config.server_address());
    Ok(())
}
