//! Section padding and padding-size discovery.
//!
//! Sections are padded to a multiple of the padding size, which usually
//! equals the header's `page_size`. Some vendor images (Huawei C8600 and
//! friends) pad to a different quantum, so on unpack the real quantum is
//! measured instead of trusted.

use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;

/// Bytes needed after `size` to reach the next multiple of `quantum`.
/// Always in `0..quantum`. `quantum` must be non-zero.
pub fn padding(size: u64, quantum: u32) -> u64 {
    let quantum = u64::from(quantum);
    (quantum - size % quantum) % quantum
}

/// `size` rounded up to a multiple of `quantum`.
pub fn align_up(size: u64, quantum: u32) -> u64 {
    size + padding(size, quantum)
}

/// Measure the effective padding size of an image.
///
/// `image_start` is the offset of the boot header within `reader`. Starting
/// one `page_size` past it, whole pages are read for as long as they are
/// entirely zero; the offset of the first page that is not (or of the end of
/// the stream) relative to `image_start` is the padding size. The reader is
/// left at that offset, which is where the kernel begins.
///
/// At most one read per page remaining in the stream is made, so fully
/// zeroed or truncated inputs terminate. A result of zero falls back to
/// `page_size`.
pub fn discover_padding_size<R: Read + Seek>(
    reader: &mut R,
    image_start: u64,
    page_size: u32,
) -> Result<u32> {
    let first = image_start + u64::from(page_size);
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(first))?;

    let max_pages = end.saturating_sub(first) / u64::from(page_size) + 1;
    let mut page = vec![0u8; page_size as usize];
    let mut pos = first;

    for _ in 0..max_pages {
        let n = read_full(reader, &mut page)?;
        if n == page.len() && page.iter().all(|&b| b == 0) {
            pos += n as u64;
            continue;
        }
        break;
    }

    reader.seek(SeekFrom::Start(pos))?;
    let size = pos.saturating_sub(image_start).min(u64::from(u32::MAX)) as u32;
    Ok(if size == 0 { page_size } else { size })
}

/// Read until `buf` is full or the stream ends; returns the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
