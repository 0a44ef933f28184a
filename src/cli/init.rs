//! Init command - write a codesight.toml for a project

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use crate::config::init_project_config;

/// Run the init command
pub(super) fn run(path: &Path, force: bool) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let config_path = init_project_config(&root, force)?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    println!(
        "\n{} Edit it to tune thresholds, disable detectors or enable AI review.",
        style("→").dim()
    );
    println!("  Then run: {}", style("codesight analyze .").bold());
    Ok(())
}
