//! List command - prints a manifest for a directory tree.

use anyhow::{Context, Result};
use std::path::Path;

use bootimg::cpio;

/// Execute the list command.
pub fn cmd_list(dir: &Path) -> Result<()> {
    let manifest = cpio::list_directory(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    print!("{}", manifest.render());
    Ok(())
}
