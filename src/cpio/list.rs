//! Build an archive manifest from a directory tree.
//!
//! Useful when a ramdisk tree was assembled by hand and there is no
//! `cpiolist.txt` from a previous unpack. Symlinks are recorded, never
//! followed. Anything that is not a file, directory or symlink is left out.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use walkdir::WalkDir;

use super::{ArchiveManifest, ManifestEntry};
use crate::error::{Error, Result};

/// Walk `root` and describe every entry below it, parents before children.
/// Entry names are relative to `root`; file sources are full paths.
pub fn list_directory(root: &Path) -> Result<ArchiveManifest> {
    let mut manifest = ArchiveManifest::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::File(path, e.into())
        })?;
        let path = entry.path();
        let Some(name) = relative_name(root, path) else {
            continue;
        };

        let meta = fs::symlink_metadata(path).map_err(|e| Error::File(path.to_path_buf(), e))?;
        let mode = meta.permissions().mode() & 0o7777;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|e| Error::File(path.to_path_buf(), e))?;
            manifest.entries.push(ManifestEntry::symlink(
                name,
                target.to_string_lossy(),
                mode,
            ));
        } else if file_type.is_dir() {
            manifest.entries.push(ManifestEntry::directory(name, mode));
        } else if file_type.is_file() {
            manifest.entries.push(ManifestEntry::file(name, path, mode));
        } else {
            log::debug!("Skipping special file {}", path.display());
        }
    }

    Ok(manifest)
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
