//! Work directory unpack/repack tests.
//!
//! Run with: cargo test --test workflow_tests

mod helpers;

use std::fs;
use std::io::Cursor;

use bootimg::bootimg::{self as boot, BootInfo};
use bootimg::config::Config;
use bootimg::cpio::{self, ArchiveManifest, EntryData};
use bootimg::{mtk, ramdisk};
use bootimg::workflow::{self, RepackOptions, BOOTINFO_FILE, MANIFEST_FILE};
use helpers::*;

fn unpack_mock_image(env: &TestEnv) -> Vec<u8> {
    let image = build_image(build_mock_ramdisk(&env.scratch));
    let path = env.write_work_file("boot.img", &image);
    workflow::unpack_bootimg(&path, &env.work_dir, "initrd").unwrap();
    image
}

#[test]
fn test_unpack_bootimg_layout() {
    let env = TestEnv::new();
    let image = build_image(build_mock_ramdisk(&env.scratch));
    let path = env.write_work_file("boot.img", &image);

    let summary = workflow::unpack_bootimg(&path, &env.work_dir, "initrd").unwrap();
    assert_eq!(summary.padding_size, Some(PAGE_SIZE));
    assert_eq!(summary.entry_count, 5);
    assert_eq!(summary.compress_level, 6);
    assert!(summary.mtk_header_name.is_none());

    assert!(env.work_dir.join("kernel").is_file());
    assert!(env.work_dir.join("ramdisk.gz").is_file());
    assert!(!env.work_dir.join("second").exists());
    assert_eq!(
        fs::read_to_string(env.work_dir.join("initrd/init.rc")).unwrap(),
        "on early-init\n    start ueventd\n"
    );

    let info = BootInfo::load(&env.work_dir.join(BOOTINFO_FILE)).unwrap();
    assert_eq!(info.base, Some(BASE));
    assert_eq!(info.page_size, Some(PAGE_SIZE));
    assert_eq!(info.cmdline.as_deref(), Some(CMDLINE));

    // Manifest sources are stored relative to the work directory.
    let manifest = ArchiveManifest::load(&env.work_dir.join(MANIFEST_FILE)).unwrap();
    assert_eq!(manifest.compress_level, Some(6));
    match &manifest.get("sbin/adbd").unwrap().data {
        EntryData::File { source } => assert!(source.is_relative()),
        other => panic!("expected file entry, got {other:?}"),
    }
}

#[test]
fn test_unpack_repack_reproduces_image() {
    let env = TestEnv::new();
    let image = unpack_mock_image(&env);

    let summary =
        workflow::repack_bootimg(&env.work_dir, &RepackOptions::default(), &Config::default())
            .unwrap();
    assert!(summary.diagnostics.is_empty());

    let rebuilt = fs::read(&summary.output).unwrap();
    assert_eq!(rebuilt, image);
}

#[test]
fn test_repack_picks_up_edits() {
    let env = TestEnv::new();
    unpack_mock_image(&env);

    fs::write(env.work_dir.join("initrd/default.prop"), "ro.secure=0\n").unwrap();
    let options = RepackOptions {
        cmdline: Some("console=ttyMSM0".to_string()),
        ..RepackOptions::default()
    };
    let summary = workflow::repack_bootimg(&env.work_dir, &options, &Config::default()).unwrap();

    let rebuilt = fs::read(&summary.output).unwrap();
    let parsed = boot::parse(&mut Cursor::new(&rebuilt)).unwrap();
    assert_eq!(parsed.header.cmdline, "console=ttyMSM0");
    assert_eq!(parsed.header.base(), BASE);

    let out = env.scratch.join("check");
    ramdisk::unpack_bytes(&parsed.sections.ramdisk, &out).unwrap();
    assert_eq!(
        fs::read_to_string(out.join("default.prop")).unwrap(),
        "ro.secure=0\n"
    );
}

#[test]
fn test_mtk_wrapper_survives_round_trip() {
    let env = TestEnv::new();
    let image = build_image(build_mock_ramdisk(&env.scratch));
    let wrapped = mtk::add(&image, "RECOVERY").unwrap();
    let path = env.write_work_file("recovery.img", &wrapped);

    let summary = workflow::unpack_bootimg(&path, &env.work_dir, "initrd").unwrap();
    assert_eq!(summary.mtk_header_name.as_deref(), Some("RECOVERY"));

    let summary =
        workflow::repack_bootimg(&env.work_dir, &RepackOptions::default(), &Config::default())
            .unwrap();
    assert_eq!(fs::read(&summary.output).unwrap(), wrapped);
}

#[test]
fn test_unpack_refuses_existing_ramdisk_dir() {
    let env = TestEnv::new();
    let image = build_image(build_mock_ramdisk(&env.scratch));
    let path = env.write_work_file("boot.img", &image);
    fs::create_dir_all(env.work_dir.join("initrd")).unwrap();

    let err = workflow::unpack_bootimg(&path, &env.work_dir, "initrd").unwrap_err();
    assert!(format!("{err:#}").contains("already exists"));
}

#[test]
fn test_ramdisk_only_round_trip() {
    let env = TestEnv::new();
    let ramdisk_file = env.write_work_file("ramdisk.gz", &build_mock_ramdisk(&env.scratch));
    assert_eq!(
        workflow::unpack::find_default_ramdisk(&env.work_dir),
        Some(ramdisk_file.clone())
    );

    let dest = env.work_dir.join("root");
    let summary = workflow::unpack_ramdisk(&ramdisk_file, &env.work_dir, &dest).unwrap();
    assert_eq!(summary.entry_count, 5);

    let config = Config {
        compress_level: 1,
        ..Config::default()
    };
    let summary = workflow::repack_ramdisk(&env.work_dir, None, &config).unwrap();
    // The level recorded in cpiolist.txt wins over the config.
    assert_eq!(summary.compress_level, 6);

    let rebuilt = fs::read(&summary.output).unwrap();
    let out = env.scratch.join("check");
    let unpacked = ramdisk::unpack_bytes(&rebuilt, &out).unwrap();
    assert_eq!(unpacked.manifest.entries.len(), 5);
}

#[test]
fn test_list_directory_matches_unpacked_tree() {
    let env = TestEnv::new();
    unpack_mock_image(&env);

    let listed = cpio::list_directory(&env.work_dir.join("initrd")).unwrap();
    for name in ["init.rc", "default.prop", "sbin", "sbin/adbd", "init"] {
        assert!(listed.contains(name), "{name} missing from listing");
    }
    match &listed.get("init").unwrap().data {
        EntryData::Symlink { target } => assert_eq!(target, "sbin/adbd"),
        other => panic!("expected symlink, got {other:?}"),
    }
}

#[test]
fn test_find_default_image_prefers_boot_img() {
    let env = TestEnv::new();
    assert!(workflow::unpack::find_default_image(&env.work_dir).is_none());

    env.write_work_file("recovery.img", b"x");
    env.write_work_file("boot.img", b"x");
    assert_eq!(
        workflow::unpack::find_default_image(&env.work_dir),
        Some(env.work_dir.join("boot.img"))
    );
}
