//! Minimal gzip framing for ramdisk archives.
//!
//! Boot tooling expects the exact 10-byte header `1f 8b 08 00 00000000 00 03`
//! with no stored file name, so the header is written by hand around a raw
//! deflate stream. On the way in the trailer (CRC32 + length) is never
//! checked: vendor ramdisks with patched or truncated trailers still unpack.

use std::io::{self, Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use crate::error::{Error, Result};

/// Leading bytes of any deflate-method gzip member.
pub const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// The fixed header: no flags, mtime 0, no extra flags, OS = Unix.
pub const MINIMAL_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03];

const FLAG_HCRC: u8 = 0x02;
const FLAG_EXTRA: u8 = 0x04;
const FLAG_NAME: u8 = 0x08;
const FLAG_COMMENT: u8 = 0x10;

/// Whether `data` starts with the gzip/deflate magic.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Prefix a raw deflate stream with the minimal header.
pub fn wrap(raw_deflate: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MINIMAL_HEADER.len() + raw_deflate.len());
    out.extend_from_slice(&MINIMAL_HEADER);
    out.extend_from_slice(raw_deflate);
    out
}

/// Compress `data` at `level` (clamped to 1..=9) into a complete gzip member:
/// minimal header, deflate body, CRC32 and length trailer.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let level = level.clamp(1, 9);
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    let raw = encoder.finish()?;

    let mut crc = Crc::new();
    crc.update(data);

    let mut out = wrap(&raw);
    out.extend_from_slice(&crc.sum().to_le_bytes());
    out.extend_from_slice(&crc.amount().to_le_bytes());
    Ok(out)
}

/// Consume a gzip header from `reader` and return a decoder over the body.
///
/// Optional header fields (extra, name, comment, header CRC) are skipped so
/// generic encoders' output is accepted too. Whatever follows the deflate
/// stream is never read.
pub fn unwrap_reader<R: Read>(mut reader: R) -> Result<DeflateDecoder<R>> {
    let mut header = [0u8; 10];
    reader
        .read_exact(&mut header)
        .map_err(Error::truncated("gzip header"))?;
    if !is_gzip(&header) {
        return Err(Error::format("invalid gzip magic"));
    }

    let flags = header[3];
    if flags & FLAG_EXTRA != 0 {
        let mut len = [0u8; 2];
        reader
            .read_exact(&mut len)
            .map_err(Error::truncated("gzip extra field"))?;
        skip_exact(&mut reader, u16::from_le_bytes(len) as u64)?;
    }
    if flags & FLAG_NAME != 0 {
        skip_cstr(&mut reader)?;
    }
    if flags & FLAG_COMMENT != 0 {
        skip_cstr(&mut reader)?;
    }
    if flags & FLAG_HCRC != 0 {
        skip_exact(&mut reader, 2)?;
    }

    Ok(DeflateDecoder::new(reader))
}

/// Decompress a whole gzip member, ignoring its trailer.
pub fn unwrap<R: Read>(reader: R) -> Result<Vec<u8>> {
    let mut decoder = unwrap_reader(reader)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn skip_exact<R: Read>(reader: &mut R, len: u64) -> Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped != len {
        return Err(Error::format("truncated gzip header"));
    }
    Ok(())
}

fn skip_cstr<R: Read>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    loop {
        reader
            .read_exact(&mut byte)
            .map_err(Error::truncated("gzip header string"))?;
        if byte[0] == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"070701 the quick brown fox jumps over the lazy dog 070701";

    #[test]
    fn test_minimal_header_layout() {
        let out = compress(PAYLOAD, 6).unwrap();
        assert_eq!(&out[..10], &MINIMAL_HEADER);
        // No FNAME flag, so the deflate body starts right after the header.
        assert_eq!(out[3], 0);
        assert_eq!(out[9], 3);
    }

    #[test]
    fn test_compress_unwrap() {
        let out = compress(PAYLOAD, 9).unwrap();
        assert_eq!(unwrap(&out[..]).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_corrupted_trailer_is_ignored() {
        let mut out = compress(PAYLOAD, 6).unwrap();
        let len = out.len();
        out[len - 8..].fill(0);
        assert_eq!(unwrap(&out[..]).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_missing_trailer_is_ignored() {
        let out = compress(PAYLOAD, 6).unwrap();
        let truncated = &out[..out.len() - 8];
        assert_eq!(unwrap(truncated).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_accepts_stored_filename() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(PAYLOAD).unwrap();
        let raw = encoder.finish().unwrap();

        let mut framed = vec![0x1f, 0x8b, 0x08, FLAG_NAME, 0, 0, 0, 0, 0, 3];
        framed.extend_from_slice(b"ramdisk.cpio\0");
        framed.extend_from_slice(&raw);
        assert_eq!(unwrap(&framed[..]).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let err = unwrap(&b"070701000000000000"[..]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08, 0x00]));
        assert!(!is_gzip(&[0x1f, 0x8b]));
        assert!(!is_gzip(b"070701"));
    }
}
