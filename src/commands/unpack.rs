//! Unpack commands.

use anyhow::{bail, Result};
use std::path::Path;

use bootimg::workflow::{self, unpack};

use super::print_diagnostics;

/// Execute the unpack-bootimg command.
pub fn cmd_unpack_bootimg(work_dir: &Path, image: Option<&Path>, ramdisk_dir: &str) -> Result<()> {
    let image = match image {
        Some(image) => image.to_path_buf(),
        None => match unpack::find_default_image(work_dir) {
            Some(image) => image,
            None => bail!(
                "No image given and none of {:?} found in {}",
                workflow::DEFAULT_IMAGES,
                work_dir.display()
            ),
        },
    };

    println!("=== Unpacking {} ===", image.display());
    let summary = workflow::unpack_bootimg(&image, work_dir, ramdisk_dir)?;

    if let Some(header) = &summary.header {
        println!("  base:         0x{:08x}", header.base());
        println!("  page_size:    0x{:x}", header.page_size);
    }
    if let Some(padding) = summary.padding_size {
        println!("  padding_size: 0x{padding:x}");
    }
    if let Some(name) = &summary.mtk_header_name {
        println!("  MTK header:   {name}");
    }
    for file in &summary.section_files {
        println!("  wrote {}", file.display());
    }
    println!(
        "  ramdisk: {} entries in {} (level {})",
        summary.entry_count,
        summary.ramdisk_dir.display(),
        summary.compress_level
    );
    println!("  manifest: {}", summary.manifest_file.display());

    print_diagnostics(&summary.diagnostics);
    Ok(())
}

/// Execute the unpack-ramdisk command.
pub fn cmd_unpack_ramdisk(work_dir: &Path, ramdisk: Option<&Path>, dest: &Path) -> Result<()> {
    let ramdisk = match ramdisk {
        Some(ramdisk) => ramdisk.to_path_buf(),
        None => match unpack::find_default_ramdisk(work_dir) {
            Some(ramdisk) => ramdisk,
            None => bail!("No ramdisk given and none found in {}", work_dir.display()),
        },
    };

    println!("=== Unpacking ramdisk {} ===", ramdisk.display());
    let summary = workflow::unpack_ramdisk(&ramdisk, work_dir, dest)?;

    if let Some(name) = &summary.mtk_header_name {
        println!("  MTK header: {name}");
    }
    println!(
        "  {} entries in {} (level {})",
        summary.entry_count,
        summary.ramdisk_dir.display(),
        summary.compress_level
    );
    println!("  manifest: {}", summary.manifest_file.display());

    print_diagnostics(&summary.diagnostics);
    Ok(())
}
