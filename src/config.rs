//! Configuration management for bootimg.
//!
//! Reads defaults from a .env file and environment variables.
//! Environment variables take precedence over .env file. These defaults only
//! apply when neither the command line nor a `bootinfo.txt`/`cpiolist.txt`
//! sidecar provides a value.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::bootimg::info::parse_hex;
use crate::bootimg::ImageParams;

pub const DEFAULT_BASE: u32 = 0x1000_0000;
pub const DEFAULT_PAGE_SIZE: u32 = 0x800;
pub const DEFAULT_PADDING_SIZE: u32 = 0x800;
pub const DEFAULT_CMDLINE: &str = "mem=211M console=null androidboot.hardware=qcom";
pub const DEFAULT_COMPRESS_LEVEL: u32 = 6;
pub const DEFAULT_RAMDISK_DIR: &str = "initrd";

/// bootimg configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Load base when bootinfo has none (BOOTIMG_BASE, hex)
    pub base: u32,
    /// Header page size (BOOTIMG_PAGE_SIZE, hex)
    pub page_size: u32,
    /// Section padding quantum (BOOTIMG_PADDING_SIZE, hex)
    pub padding_size: u32,
    /// Kernel command line (BOOTIMG_CMDLINE)
    pub cmdline: String,
    /// gzip level when cpiolist.txt has none (BOOTIMG_COMPRESS_LEVEL, 0-9)
    pub compress_level: u32,
    /// Directory the ramdisk is extracted to (BOOTIMG_RAMDISK_DIR)
    pub ramdisk_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            page_size: DEFAULT_PAGE_SIZE,
            padding_size: DEFAULT_PADDING_SIZE,
            cmdline: DEFAULT_CMDLINE.to_string(),
            compress_level: DEFAULT_COMPRESS_LEVEL,
            ramdisk_dir: DEFAULT_RAMDISK_DIR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `base_dir/.env` and the environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                env_vars.extend(parse_env(&content));
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        Self::from_vars(&env_vars)
    }

    /// Build a config from a variable map, ignoring unparsable values.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let hex = |key: &str, default: u32| {
            vars.get(key)
                .and_then(|v| {
                    let parsed = parse_hex(v);
                    if parsed.is_none() {
                        log::warn!("Ignoring {key}={v:?}: not a hex number");
                    }
                    parsed
                })
                .filter(|&v| v != 0 || key == "BOOTIMG_BASE")
                .unwrap_or(default)
        };

        Self {
            base: hex("BOOTIMG_BASE", defaults.base),
            page_size: hex("BOOTIMG_PAGE_SIZE", defaults.page_size),
            padding_size: hex("BOOTIMG_PADDING_SIZE", defaults.padding_size),
            cmdline: vars
                .get("BOOTIMG_CMDLINE")
                .cloned()
                .unwrap_or(defaults.cmdline),
            compress_level: vars
                .get("BOOTIMG_COMPRESS_LEVEL")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map(|level| level.min(9))
                .unwrap_or(defaults.compress_level),
            ramdisk_dir: vars
                .get("BOOTIMG_RAMDISK_DIR")
                .cloned()
                .unwrap_or(defaults.ramdisk_dir),
        }
    }

    /// Image parameters to fall back on, with standard addresses.
    pub fn image_params(&self) -> ImageParams {
        ImageParams::standard(self.base, self.page_size, self.padding_size, &self.cmdline)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  BOOTIMG_BASE: 0x{:x}", self.base);
        println!("  BOOTIMG_PAGE_SIZE: 0x{:x}", self.page_size);
        println!("  BOOTIMG_PADDING_SIZE: 0x{:x}", self.padding_size);
        println!("  BOOTIMG_CMDLINE: {}", self.cmdline);
        println!("  BOOTIMG_COMPRESS_LEVEL: {}", self.compress_level);
        println!("  BOOTIMG_RAMDISK_DIR: {}", self.ramdisk_dir);
    }
}

/// Parse `KEY=value` lines, skipping comments and stripping quotes.
fn parse_env(content: &str) -> impl Iterator<Item = (String, String)> + '_ {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        let value = value.trim().trim_matches('"').trim_matches('\'');
        Some((key.trim().to_string(), value.to_string()))
    })
}
