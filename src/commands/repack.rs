//! Repack commands.

use anyhow::Result;
use std::path::Path;

use bootimg::config::Config;
use bootimg::workflow::{self, RepackOptions};

use super::print_diagnostics;

/// Execute the repack-ramdisk command.
pub fn cmd_repack_ramdisk(work_dir: &Path, manifest: Option<&Path>, config: &Config) -> Result<()> {
    println!("=== Repacking ramdisk ===");
    let summary = workflow::repack_ramdisk(work_dir, manifest, config)?;

    println!("  level: {}", summary.compress_level);
    if let Some(name) = &summary.mtk_header_name {
        println!("  MTK header: {name}");
    }
    println!("  wrote {}", summary.output.display());

    print_diagnostics(&summary.diagnostics);
    Ok(())
}

/// Execute the repack-bootimg command.
pub fn cmd_repack_bootimg(work_dir: &Path, options: &RepackOptions, config: &Config) -> Result<()> {
    println!("=== Repacking boot image ===");
    let summary = workflow::repack_bootimg(work_dir, options, config)?;

    if let Some(params) = &summary.params {
        println!("  base:         0x{:08x}", params.base);
        println!("  ramdisk_addr: 0x{:08x}", params.ramdisk_addr);
        println!("  second_addr:  0x{:08x}", params.second_addr);
        println!("  tags_addr:    0x{:08x}", params.tags_addr);
        println!("  page_size:    0x{:x}", params.page_size);
        println!("  padding_size: 0x{:x}", params.padding_size);
        println!("  cmdline:      {}", params.cmdline);
    }
    if let Some(header) = &summary.header {
        println!(
            "  kernel {} bytes, ramdisk {} bytes, second {} bytes, dt {} bytes",
            header.kernel_size, header.ramdisk_size, header.second_size, header.dt_size
        );
    }
    if let Some(name) = &summary.mtk_header_name {
        println!("  MTK header:   {name}");
    }
    println!("  wrote {}", summary.output.display());

    print_diagnostics(&summary.diagnostics);
    Ok(())
}
