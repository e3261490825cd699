//! Rebuild a ramdisk and boot image from an unpacked work directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{BOOTINFO_FILE, DEFAULT_OUTPUT, MANIFEST_FILE, REPACKED_RAMDISK_FILE};
use crate::bootimg::{self, BootImageHeader, BootInfo, ImageParams, Sections};
use crate::config::Config;
use crate::cpio::ArchiveManifest;
use crate::error::Diagnostic;
use crate::{mtk, ramdisk};

/// Explicit overrides; each wins over `bootinfo.txt` and the config.
#[derive(Debug, Clone, Default)]
pub struct RepackOptions {
    pub base: Option<u32>,
    pub cmdline: Option<String>,
    pub page_size: Option<u32>,
    pub padding_size: Option<u32>,
    /// Manifest to rebuild the ramdisk from (default `cpiolist.txt`).
    pub manifest: Option<PathBuf>,
    /// Output image (default `boot-new.img`).
    pub output: Option<PathBuf>,
}

/// What a repack produced.
#[derive(Debug, Clone)]
pub struct RepackSummary {
    pub output: PathBuf,
    pub header: Option<BootImageHeader>,
    pub params: Option<ImageParams>,
    pub ramdisk_file: PathBuf,
    pub compress_level: u32,
    pub mtk_header_name: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rebuild `ramdisk.cpio.gz` in `work_dir` from a manifest.
pub fn repack_ramdisk(work_dir: &Path, manifest: Option<&Path>, config: &Config) -> Result<RepackSummary> {
    let manifest_path = manifest
        .map(Path::to_path_buf)
        .unwrap_or_else(|| work_dir.join(MANIFEST_FILE));
    let manifest = ArchiveManifest::load(&manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;

    let packed = ramdisk::repack(&manifest, work_dir, config.compress_level)
        .with_context(|| format!("Failed to build ramdisk from {}", manifest_path.display()))?;

    let output = work_dir.join(REPACKED_RAMDISK_FILE);
    write_atomic(&output, &packed.data)?;

    Ok(RepackSummary {
        output: output.clone(),
        header: None,
        params: None,
        ramdisk_file: output,
        compress_level: packed.compress_level,
        mtk_header_name: manifest.mtk_name().map(str::to_string),
        diagnostics: packed.diagnostics,
    })
}

/// Rebuild the ramdisk, then the boot image, from `work_dir`.
///
/// Parameters are taken from `options`, then `bootinfo.txt`, then `config`.
/// If `bootinfo.txt` records an MTK wrapper it is re-added.
pub fn repack_bootimg(work_dir: &Path, options: &RepackOptions, config: &Config) -> Result<RepackSummary> {
    let ramdisk = repack_ramdisk(work_dir, options.manifest.as_deref(), config)?;

    let explicit = BootInfo {
        base: options.base,
        cmdline: options.cmdline.clone(),
        page_size: options.page_size,
        padding_size: options.padding_size,
        ..BootInfo::default()
    };
    let info_path = work_dir.join(BOOTINFO_FILE);
    let recorded = if info_path.exists() {
        BootInfo::load(&info_path)
            .with_context(|| format!("Failed to read {}", info_path.display()))?
    } else {
        log::warn!("{} not found, using defaults", info_path.display());
        BootInfo::default()
    };
    let info = explicit.or(recorded);
    let params = info.resolve(&config.image_params());

    let kernel = find_section(work_dir, "kernel")?
        .with_context(|| format!("No kernel found in {}", work_dir.display()))?;
    let sections = Sections {
        kernel: read(&kernel)?,
        ramdisk: read(&ramdisk.ramdisk_file)?,
        second: find_section(work_dir, "second")?.map(|p| read(&p)).transpose()?,
        device_tree: find_section(work_dir, "dt_image")?
            .map(|p| read(&p))
            .transpose()?,
    };

    let mut image = Vec::new();
    let header = bootimg::serialize(&params, &sections, &mut image).context("Failed to build boot image")?;

    let image = match info.mtk_name() {
        Some(name) => mtk::add(&image, name)?,
        None => image,
    };

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| work_dir.join(DEFAULT_OUTPUT));
    write_atomic(&output, &image)?;

    Ok(RepackSummary {
        output,
        header: Some(header),
        params: Some(params),
        ramdisk_file: ramdisk.ramdisk_file,
        compress_level: ramdisk.compress_level,
        mtk_header_name: info.mtk_name().map(str::to_string),
        diagnostics: ramdisk.diagnostics,
    })
}

/// Locate a section file, preferring the `.gz` variant.
fn find_section(work_dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    for candidate in [format!("{stem}.gz"), stem.to_string()] {
        let path = work_dir.join(candidate);
        if path.is_file() {
            return Ok(Some(path));
        }
        if path.exists() {
            bail!("{} is not a regular file", path.display());
        }
    }
    Ok(None)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write to a temporary sibling, then rename into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}
