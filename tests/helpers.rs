//! Shared test utilities for bootimg tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use bootimg::bootimg::{ImageParams, Sections};
use bootimg::cpio::{ArchiveManifest, ManifestEntry};
use bootimg::ramdisk;

pub const BASE: u32 = 0x1000_0000;
pub const PAGE_SIZE: u32 = 2048;
pub const CMDLINE: &str = "console=ttyHSL0,115200,n8 androidboot.hardware=qcom";

/// Test environment with a temporary work directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Work directory passed to the workflow functions
    pub work_dir: PathBuf,
    /// Scratch directory for sources and extraction targets
    pub scratch: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let work_dir = temp_dir.path().join("work");
        let scratch = temp_dir.path().join("scratch");

        fs::create_dir_all(&work_dir).expect("Failed to create work dir");
        fs::create_dir_all(&scratch).expect("Failed to create scratch dir");

        Self {
            _temp_dir: temp_dir,
            work_dir,
            scratch,
        }
    }

    /// Write `data` as `name` in the work directory and return its path.
    pub fn write_work_file(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.work_dir.join(name);
        fs::write(&path, data).expect("Failed to write work file");
        path
    }
}

/// Section content that never reads as a zero page.
pub fn section(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) | 1)
        .collect()
}

/// Create a small ramdisk source tree and the manifest describing it.
pub fn create_mock_ramdisk(root: &Path) -> ArchiveManifest {
    fs::create_dir_all(root.join("sbin")).expect("Failed to create sbin");
    fs::write(root.join("init.rc"), "on early-init\n    start ueventd\n")
        .expect("Failed to write init.rc");
    fs::write(root.join("default.prop"), "ro.secure=1\n").expect("Failed to write default.prop");
    fs::write(root.join("sbin/adbd"), section(3000, 7)).expect("Failed to write adbd");

    let mut manifest = ArchiveManifest::default();
    manifest.compress_level = Some(6);
    manifest.push(ManifestEntry::directory("sbin", 0o750));
    manifest.push(ManifestEntry::file("default.prop", "default.prop", 0o644));
    manifest.push(ManifestEntry::file("init.rc", "init.rc", 0o750));
    manifest.push(ManifestEntry::file("sbin/adbd", "sbin/adbd", 0o750));
    manifest.push(ManifestEntry::symlink("init", "sbin/adbd", 0o777));
    manifest
}

/// Gzip-framed ramdisk built from [`create_mock_ramdisk`].
pub fn build_mock_ramdisk(root: &Path) -> Vec<u8> {
    let manifest = create_mock_ramdisk(root);
    ramdisk::repack(&manifest, root, 6)
        .expect("Failed to build ramdisk")
        .data
}

/// Standard image parameters used across tests.
pub fn standard_params() -> ImageParams {
    ImageParams::standard(BASE, PAGE_SIZE, PAGE_SIZE, CMDLINE)
}

/// Boot image with a synthetic kernel and the given ramdisk.
pub fn build_image(ramdisk: Vec<u8>) -> Vec<u8> {
    let sections = Sections {
        kernel: section(5000, 3),
        ramdisk,
        second: None,
        device_tree: None,
    };
    bootimg::bootimg::to_vec(&standard_params(), &sections).expect("Failed to build image")
}
