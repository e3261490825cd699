//! Ramdisk images: an optional MTK wrapper around an optionally
//! gzip-framed newc archive.

use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::cpio::{self, newc::NEWC_MAGIC, ArchiveManifest};
use crate::error::{Diagnostic, Error, Result};
use crate::{gzip, mtk};

/// Level recorded for gzip input. The original level is not recoverable.
pub const GZIP_INPUT_LEVEL: u32 = 6;

/// Extract a ramdisk under `dest`, which must not exist yet.
///
/// The returned manifest records the compression level and, if the ramdisk
/// was wrapped, the MTK header mode and name.
pub fn unpack<R: Read + Seek>(reader: &mut R, dest: &Path) -> Result<cpio::Unpacked> {
    if dest.symlink_metadata().is_ok() {
        return Err(Error::DestinationExists(dest.to_path_buf()));
    }

    let wrapper = mtk::detect_and_strip(reader)?;
    let pos = reader.stream_position()?;
    let mut magic = [0u8; 6];
    let n = reader.read(&mut magic)?;
    reader.seek(SeekFrom::Start(pos))?;

    let compressed = if gzip::is_gzip(&magic[..n]) {
        log::info!("Ramdisk is gzip compressed");
        true
    } else if &magic[..n] == NEWC_MAGIC {
        log::info!("Ramdisk is an uncompressed cpio archive");
        false
    } else {
        return Err(Error::format("invalid ramdisk: neither gzip nor newc cpio"));
    };

    fs::create_dir_all(dest).map_err(|e| Error::File(dest.to_path_buf(), e))?;
    let (mut unpacked, level) = if compressed {
        let mut decoder = gzip::unwrap_reader(reader)?;
        (cpio::parse(&mut decoder, dest)?, GZIP_INPUT_LEVEL)
    } else {
        (cpio::parse(reader, dest)?, 0)
    };

    unpacked.manifest.compress_level = Some(level);
    if let Some(wrapper) = wrapper {
        unpacked.manifest.mode = Some("mtk".to_string());
        unpacked.manifest.mtk_header_name = Some(wrapper.name);
    }
    Ok(unpacked)
}

/// Convenience wrapper over [`unpack`] for in-memory ramdisks.
pub fn unpack_bytes(data: &[u8], dest: &Path) -> Result<cpio::Unpacked> {
    unpack(&mut Cursor::new(data), dest)
}

/// Rebuilt ramdisk image.
#[derive(Debug, Clone)]
pub struct Packed {
    pub data: Vec<u8>,
    pub compress_level: u32,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build a ramdisk image from `manifest`.
///
/// `default_level` applies when the manifest records no level. Levels above
/// 9 are clamped, 0 leaves the archive uncompressed. The MTK wrapper is
/// re-added when the manifest records one.
pub fn repack(
    manifest: &ArchiveManifest,
    source_root: &Path,
    default_level: u32,
) -> Result<Packed> {
    let mut archive = Vec::new();
    let diagnostics = cpio::serialize(manifest, source_root, &mut archive, true)?;

    let compress_level = manifest.compress_level.unwrap_or(default_level).min(9);
    let data = if compress_level == 0 {
        archive
    } else {
        gzip::compress(&archive, compress_level)?
    };
    let data = match manifest.mtk_name() {
        Some(name) => mtk::add(&data, name)?,
        None => data,
    };

    Ok(Packed {
        data,
        compress_level,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpio::ManifestEntry;
    use tempfile::TempDir;

    fn sample(tmp: &Path) -> ArchiveManifest {
        fs::write(tmp.join("init.rc"), "on init\n").unwrap();
        let mut manifest = ArchiveManifest::default();
        manifest.push(ManifestEntry::directory("sbin", 0o750));
        manifest.push(ManifestEntry::file("init.rc", tmp.join("init.rc"), 0o644));
        manifest
    }

    #[test]
    fn test_gzip_round_trip_records_level() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = sample(tmp.path());
        manifest.compress_level = Some(9);

        let packed = repack(&manifest, tmp.path(), 6).unwrap();
        assert!(gzip::is_gzip(&packed.data));

        let unpacked = unpack_bytes(&packed.data, &tmp.path().join("out")).unwrap();
        assert_eq!(unpacked.manifest.compress_level, Some(GZIP_INPUT_LEVEL));
        assert_eq!(unpacked.manifest.entries.len(), 2);
        assert_eq!(
            fs::read_to_string(tmp.path().join("out/init.rc")).unwrap(),
            "on init\n"
        );
    }

    #[test]
    fn test_raw_archive() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = sample(tmp.path());
        manifest.compress_level = Some(0);

        let packed = repack(&manifest, tmp.path(), 6).unwrap();
        assert!(packed.data.starts_with(NEWC_MAGIC));
        assert_eq!(packed.data.len() % 512, 0);

        let unpacked = unpack_bytes(&packed.data, &tmp.path().join("out")).unwrap();
        assert_eq!(unpacked.manifest.compress_level, Some(0));
    }

    #[test]
    fn test_mtk_wrapper_is_restored() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = sample(tmp.path());
        manifest.mode = Some("mtk".into());
        manifest.mtk_header_name = Some("ROOTFS".into());

        let packed = repack(&manifest, tmp.path(), 6).unwrap();
        assert_eq!(&packed.data[..4], &mtk::MTK_MAGIC.to_le_bytes());

        let unpacked = unpack_bytes(&packed.data, &tmp.path().join("out")).unwrap();
        assert_eq!(unpacked.manifest.mtk_name(), Some("ROOTFS"));
    }

    #[test]
    fn test_existing_destination_is_refused() {
        let tmp = TempDir::new().unwrap();
        let err = unpack_bytes(b"070701", tmp.path()).unwrap_err();
        assert!(matches!(err, Error::DestinationExists(_)));
    }

    #[test]
    fn test_unknown_magic() {
        let tmp = TempDir::new().unwrap();
        let err = unpack_bytes(b"PK\x03\x04zip!", &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
