//! MediaTek 512-byte wrapper header.
//!
//! Some MTK devices prefix boot images and ramdisks with:
//!
//! ```text
//! 0x000  u32  magic 0x58881688
//! 0x004  u32  payload size (file size - 0x200)
//! 0x008  32s  name, NUL padded ("KERNEL", "ROOTFS", ...)
//! 0x028  472  0xFF fill
//! 0x200  payload
//! ```

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::error::{Error, Result};

pub const MTK_MAGIC: u32 = 0x5888_1688;
pub const MTK_HEADER_SIZE: usize = 0x200;

const NAME_SIZE: usize = 32;

/// A detected wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtkHeader {
    /// Declared payload size.
    pub size: u32,
    /// Embedded name with NUL padding removed.
    pub name: String,
}

/// Detect a wrapper at the current position of `reader`.
///
/// On a match the reader is left at the start of the payload. Otherwise the
/// reader is moved back to where it was and `None` is returned.
pub fn detect_and_strip<R: Read + Seek>(reader: &mut R) -> Result<Option<MtkHeader>> {
    let offset = reader.stream_position()?;

    let mut magic = [0u8; 4];
    match reader.read_exact(&mut magic) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            reader.seek(SeekFrom::Start(offset))?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }
    if u32::from_le_bytes(magic) != MTK_MAGIC {
        reader.seek(SeekFrom::Start(offset))?;
        return Ok(None);
    }

    let mut size = [0u8; 4];
    reader
        .read_exact(&mut size)
        .map_err(Error::truncated("MTK header"))?;
    let declared = u32::from_le_bytes(size);

    let end = reader.seek(SeekFrom::End(0))?;
    let actual = (end - offset).saturating_sub(MTK_HEADER_SIZE as u64);
    if u64::from(declared) != actual {
        return Err(Error::SizeMismatch { declared, actual });
    }

    reader.seek(SeekFrom::Start(offset + 8))?;
    let mut name = [0u8; NAME_SIZE];
    reader
        .read_exact(&mut name)
        .map_err(Error::truncated("MTK header"))?;
    let name = String::from_utf8_lossy(trim_nul(&name)).into_owned();
    log::info!("Found MTK header {name:?}, skipping {MTK_HEADER_SIZE:#x} bytes");

    reader.seek(SeekFrom::Start(offset + MTK_HEADER_SIZE as u64))?;
    Ok(Some(MtkHeader {
        size: declared,
        name,
    }))
}

/// Build the 512-byte wrapper for a payload of `payload_len` bytes.
pub fn header_bytes(payload_len: usize, name: &str) -> Result<[u8; MTK_HEADER_SIZE]> {
    if name.len() > NAME_SIZE {
        return Err(Error::validation(format!(
            "MTK header name {name:?} exceeds {NAME_SIZE} bytes"
        )));
    }
    let size = u32::try_from(payload_len)
        .map_err(|_| Error::validation("MTK payload larger than 4 GiB"))?;

    let mut header = [0u8; MTK_HEADER_SIZE];
    header[..4].copy_from_slice(&MTK_MAGIC.to_le_bytes());
    header[4..8].copy_from_slice(&size.to_le_bytes());
    header[8..8 + name.len()].copy_from_slice(name.as_bytes());
    header[8 + NAME_SIZE..].fill(0xff);
    Ok(header)
}

/// Prefix `payload` with a wrapper carrying `name`.
pub fn add(payload: &[u8], name: &str) -> Result<Vec<u8>> {
    let header = header_bytes(payload.len(), name)?;
    let mut out = Vec::with_capacity(MTK_HEADER_SIZE + payload.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    Ok(out)
}

pub(crate) fn trim_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
