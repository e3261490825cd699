//! Unpack a boot image or a standalone ramdisk into a work directory.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{relative_sources, BOOTINFO_FILE, MANIFEST_FILE};
use crate::bootimg::{self, BootImageHeader};
use crate::error::Diagnostic;
use crate::{mtk, ramdisk};

/// What an unpack produced.
#[derive(Debug, Clone)]
pub struct UnpackSummary {
    /// Parsed header, when a boot image was unpacked.
    pub header: Option<BootImageHeader>,
    pub padding_size: Option<u32>,
    /// Section files written, in image order.
    pub section_files: Vec<PathBuf>,
    pub ramdisk_dir: PathBuf,
    pub manifest_file: PathBuf,
    pub entry_count: usize,
    pub compress_level: u32,
    pub mtk_header_name: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Unpack `image` into `work_dir`: sections, `bootinfo.txt`, then the
/// ramdisk into `work_dir/ramdisk_dir` with `cpiolist.txt`.
pub fn unpack_bootimg(image: &Path, work_dir: &Path, ramdisk_dir: &str) -> Result<UnpackSummary> {
    let file = File::open(image).with_context(|| format!("Failed to open {}", image.display()))?;
    let mut reader = BufReader::new(file);

    let wrapper = mtk::detect_and_strip(&mut reader)
        .with_context(|| format!("Failed to read MTK header of {}", image.display()))?;
    let parsed = bootimg::parse(&mut reader)
        .with_context(|| format!("Failed to parse boot image {}", image.display()))?;

    fs::create_dir_all(work_dir)
        .with_context(|| format!("Failed to create {}", work_dir.display()))?;

    let mut info = parsed.boot_info();
    if let Some(wrapper) = &wrapper {
        info.mode = Some("mtk".to_string());
        info.mtk_header_name = Some(wrapper.name.clone());
    }
    info.save(&work_dir.join(BOOTINFO_FILE))?;

    let mut section_files = Vec::new();
    for (kind, data) in parsed.sections.iter() {
        let path = work_dir.join(kind.file_name(data));
        fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        section_files.push(path);
    }

    let ramdisk_path = work_dir.join(ramdisk_dir);
    let mut unpacked = ramdisk::unpack_bytes(&parsed.sections.ramdisk, &ramdisk_path)
        .with_context(|| format!("Failed to unpack ramdisk into {}", ramdisk_path.display()))?;
    relative_sources(&mut unpacked.manifest, work_dir)?;
    let manifest_file = work_dir.join(MANIFEST_FILE);
    unpacked.manifest.save(&manifest_file)?;

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(unpacked.diagnostics);

    Ok(UnpackSummary {
        header: Some(parsed.header),
        padding_size: Some(parsed.padding_size),
        section_files,
        ramdisk_dir: ramdisk_path,
        manifest_file,
        entry_count: unpacked.manifest.entries.len(),
        compress_level: unpacked.manifest.compress_level.unwrap_or(0),
        mtk_header_name: wrapper.map(|w| w.name),
        diagnostics,
    })
}

/// Unpack a standalone ramdisk file into `dest`, writing the manifest to
/// `work_dir/cpiolist.txt`.
pub fn unpack_ramdisk(ramdisk_file: &Path, work_dir: &Path, dest: &Path) -> Result<UnpackSummary> {
    if dest.symlink_metadata().is_ok() {
        bail!("please remove {}", dest.display());
    }

    let file = File::open(ramdisk_file)
        .with_context(|| format!("Failed to open {}", ramdisk_file.display()))?;
    let mut unpacked = ramdisk::unpack(&mut BufReader::new(file), dest)
        .with_context(|| format!("Failed to unpack {}", ramdisk_file.display()))?;
    relative_sources(&mut unpacked.manifest, work_dir)?;

    fs::create_dir_all(work_dir)
        .with_context(|| format!("Failed to create {}", work_dir.display()))?;
    let manifest_file = work_dir.join(MANIFEST_FILE);
    unpacked.manifest.save(&manifest_file)?;

    Ok(UnpackSummary {
        header: None,
        padding_size: None,
        section_files: Vec::new(),
        ramdisk_dir: dest.to_path_buf(),
        manifest_file,
        entry_count: unpacked.manifest.entries.len(),
        compress_level: unpacked.manifest.compress_level.unwrap_or(0),
        mtk_header_name: unpacked.manifest.mtk_header_name.clone(),
        diagnostics: unpacked.diagnostics,
    })
}

/// First existing default image name in `work_dir` (`boot.img`, then
/// `recovery.img`).
pub fn find_default_image(work_dir: &Path) -> Option<PathBuf> {
    super::DEFAULT_IMAGES
        .iter()
        .map(|name| work_dir.join(name))
        .find(|path| path.exists())
}

/// First existing ramdisk file in `work_dir`.
pub fn find_default_ramdisk(work_dir: &Path) -> Option<PathBuf> {
    ["ramdisk.gz", "ramdisk", "ramdisk.cpio.gz"]
        .iter()
        .map(|name| work_dir.join(name))
        .find(|path| path.exists())
}
