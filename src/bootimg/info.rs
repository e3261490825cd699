//! Boot info sidecar (`bootinfo.txt`).
//!
//! Written on unpack, read on repack so the rebuilt image keeps the original
//! addressing. One `key:value` per line, `#` starts a comment, and the first
//! value for a key wins.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::header::{RAMDISK_OFFSET, SECOND_OFFSET, TAGS_OFFSET};
use super::ImageParams;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootInfo {
    pub base: Option<u32>,
    pub ramdisk_addr: Option<u32>,
    pub second_addr: Option<u32>,
    pub tags_addr: Option<u32>,
    pub page_size: Option<u32>,
    pub padding_size: Option<u32>,
    pub name: Option<String>,
    pub cmdline: Option<String>,
    /// Wrapper mode of the image file (`mtk`), if any.
    pub mode: Option<String>,
    pub mtk_header_name: Option<String>,
}

impl BootInfo {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::File(path.to_path_buf(), e))?;
        text.parse()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|e| Error::File(path.to_path_buf(), e))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(mode) = &self.mode {
            let _ = writeln!(out, "mode:{mode}");
        }
        if let Some(name) = &self.mtk_header_name {
            let _ = writeln!(out, "mtk_header_name:{name}");
        }
        let hex = [
            ("base", self.base),
            ("ramdisk_addr", self.ramdisk_addr),
            ("second_addr", self.second_addr),
            ("tags_addr", self.tags_addr),
            ("page_size", self.page_size),
        ];
        for (key, value) in hex {
            if let Some(value) = value {
                let _ = writeln!(out, "{key}:0x{value:x}");
            }
        }
        if let Some(name) = &self.name {
            let _ = writeln!(out, "name:{name}");
        }
        if let Some(cmdline) = &self.cmdline {
            let _ = writeln!(out, "cmdline:{cmdline}");
        }
        if let Some(size) = self.padding_size {
            let _ = writeln!(out, "padding_size:0x{size:x}");
        }
        out
    }

    /// Name of the MTK wrapper to restore, if the image had one.
    pub fn mtk_name(&self) -> Option<&str> {
        match self.mode.as_deref() {
            Some("mtk") => Some(self.mtk_header_name.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    /// Fill every unset field from `other`; set fields are kept.
    pub fn or(self, other: BootInfo) -> BootInfo {
        BootInfo {
            base: self.base.or(other.base),
            ramdisk_addr: self.ramdisk_addr.or(other.ramdisk_addr),
            second_addr: self.second_addr.or(other.second_addr),
            tags_addr: self.tags_addr.or(other.tags_addr),
            page_size: self.page_size.or(other.page_size),
            padding_size: self.padding_size.or(other.padding_size),
            name: self.name.or(other.name),
            cmdline: self.cmdline.or(other.cmdline),
            mode: self.mode.or(other.mode),
            mtk_header_name: self.mtk_header_name.or(other.mtk_header_name),
        }
    }

    /// Resolve into concrete image parameters.
    ///
    /// A missing address is derived from `base` with the standard offset;
    /// anything else missing comes from `defaults`. Every fallback is logged.
    pub fn resolve(&self, defaults: &ImageParams) -> ImageParams {
        let base = self.base.unwrap_or_else(|| {
            log::warn!("base not set, using default 0x{:x}", defaults.base);
            defaults.base
        });
        let derived = |field: &str, value: Option<u32>, offset: u32| {
            value.unwrap_or_else(|| {
                let addr = base.wrapping_add(offset);
                log::warn!("{field} not set, using 0x{addr:x}");
                addr
            })
        };
        let fallback = |field: &str, value: Option<u32>, default: u32| {
            value.unwrap_or_else(|| {
                log::warn!("{field} not set, using default 0x{default:x}");
                default
            })
        };

        ImageParams {
            base,
            ramdisk_addr: derived("ramdisk_addr", self.ramdisk_addr, RAMDISK_OFFSET),
            second_addr: derived("second_addr", self.second_addr, SECOND_OFFSET),
            tags_addr: derived("tags_addr", self.tags_addr, TAGS_OFFSET),
            page_size: fallback("page_size", self.page_size, defaults.page_size),
            padding_size: fallback("padding_size", self.padding_size, defaults.padding_size),
            name: self.name.clone().unwrap_or_default(),
            cmdline: self.cmdline.clone().unwrap_or_else(|| {
                log::warn!("cmdline not set, using default {:?}", defaults.cmdline);
                defaults.cmdline.clone()
            }),
        }
    }
}

impl FromStr for BootInfo {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut info = Self::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            let number = |slot: &mut Option<u32>| -> Result<()> {
                if slot.is_none() {
                    *slot = Some(parse_hex(value).ok_or_else(|| Error::Manifest {
                        line: line_no,
                        reason: format!("invalid {} value {value:?}", key.trim()),
                    })?);
                }
                Ok(())
            };
            let text = |slot: &mut Option<String>| {
                if slot.is_none() {
                    *slot = Some(value.to_string());
                }
            };

            match key.trim() {
                "base" => number(&mut info.base)?,
                "ramdisk_addr" => number(&mut info.ramdisk_addr)?,
                "second_addr" => number(&mut info.second_addr)?,
                "tags_addr" => number(&mut info.tags_addr)?,
                "page_size" => number(&mut info.page_size)?,
                "padding_size" => number(&mut info.padding_size)?,
                "name" => text(&mut info.name),
                "cmdline" => text(&mut info.cmdline),
                "mode" => text(&mut info.mode),
                "mtk_header_name" => text(&mut info.mtk_header_name),
                other => log::debug!("Ignoring bootinfo key {other:?}"),
            }
        }

        Ok(info)
    }
}

/// Hex with or without a `0x` prefix.
pub fn parse_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}
