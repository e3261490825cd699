//! File-level unpack/repack of boot images and ramdisks in a work directory.
//!
//! Layout of a work directory after `unpack_bootimg`:
//!
//! ```text
//! bootinfo.txt      addressing metadata (BootInfo)
//! kernel[.gz]       kernel section
//! ramdisk[.gz]      ramdisk section as found in the image
//! second[.gz]       only if present
//! dt_image[.gz]     only if present
//! cpiolist.txt      archive manifest
//! initrd/           extracted ramdisk tree
//! ```
//!
//! `repack_bootimg` reads the same layout back and writes `boot-new.img`.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cpio::{ArchiveManifest, EntryData};

pub mod repack;
pub mod unpack;

pub use repack::{repack_bootimg, repack_ramdisk, RepackOptions, RepackSummary};
pub use unpack::{unpack_bootimg, unpack_ramdisk, UnpackSummary};

pub const BOOTINFO_FILE: &str = "bootinfo.txt";
pub const MANIFEST_FILE: &str = "cpiolist.txt";
pub const REPACKED_RAMDISK_FILE: &str = "ramdisk.cpio.gz";
pub const DEFAULT_OUTPUT: &str = "boot-new.img";
pub const DEFAULT_IMAGES: &[&str] = &["boot.img", "recovery.img"];

/// Rewrite file sources so they resolve against `work_dir` at repack time:
/// paths under `work_dir` become relative to it, other relative paths
/// become absolute.
pub fn relative_sources(manifest: &mut ArchiveManifest, work_dir: &Path) -> Result<()> {
    for entry in &mut manifest.entries {
        let EntryData::File { source } = &mut entry.data else {
            continue;
        };
        if let Ok(rel) = source.strip_prefix(work_dir) {
            *source = rel.to_path_buf();
        } else if source.is_relative() {
            *source = std::path::absolute(&*source)
                .with_context(|| format!("Failed to resolve {}", source.display()))?;
        }
    }
    Ok(())
}
