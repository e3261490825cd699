//! Info command - shows boot image header fields.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bootimg::{bootimg as image_codec, mtk};

use super::print_diagnostics;

/// Execute the info command.
pub fn cmd_info(image: &Path, json: bool) -> Result<()> {
    let file = File::open(image).with_context(|| format!("Failed to open {}", image.display()))?;
    let mut reader = BufReader::new(file);
    let wrapper = mtk::detect_and_strip(&mut reader)?;
    let parsed = image_codec::parse(&mut reader)
        .with_context(|| format!("Failed to parse boot image {}", image.display()))?;

    let header = &parsed.header;
    let id = hex(header.digest());

    if json {
        let mut info = parsed.boot_info();
        if let Some(wrapper) = &wrapper {
            info.mode = Some("mtk".to_string());
            info.mtk_header_name = Some(wrapper.name.clone());
        }
        let value = serde_json::json!({
            "info": info,
            "kernel_size": header.kernel_size,
            "ramdisk_size": header.ramdisk_size,
            "second_size": header.second_size,
            "dt_size": header.dt_size,
            "id": id,
            "warnings": parsed.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("=== {} ===", image.display());
    if let Some(wrapper) = &wrapper {
        println!("  MTK header:   {} ({} bytes)", wrapper.name, wrapper.size);
    }
    println!("  name:         {}", header.name);
    println!("  cmdline:      {}", header.cmdline);
    println!("  base:         0x{:08x}", header.base());
    println!("  kernel:       {} bytes at 0x{:08x}", header.kernel_size, header.kernel_addr);
    println!("  ramdisk:      {} bytes at 0x{:08x}", header.ramdisk_size, header.ramdisk_addr);
    println!("  second:       {} bytes at 0x{:08x}", header.second_size, header.second_addr);
    println!("  dt:           {} bytes", header.dt_size);
    println!("  tags_addr:    0x{:08x}", header.tags_addr);
    println!("  page_size:    0x{:x}", header.page_size);
    println!("  padding_size: 0x{:x}", parsed.padding_size);
    println!("  id:           {id}");

    print_diagnostics(&parsed.diagnostics);
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
