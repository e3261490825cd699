//! The 110-byte "newc" header record.
//!
//! ```text
//! 6s  magic "070701"
//! 8x  ino mode uid gid nlink mtime filesize devmajor devminor rdevmajor rdevminor
//! 8x  namesize
//! 8x  check
//! ```
//!
//! Every field after the magic is eight ASCII hex digits. The name (with its
//! NUL) follows and is padded so the content starts on a 4-byte boundary.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

pub const NEWC_MAGIC: &[u8; 6] = b"070701";
pub const HEADER_LEN: usize = 110;
pub const TRAILER_NAME: &str = "TRAILER!!!";

const FIELD_COUNT: usize = 13;

/// Bytes needed to bring `len` up to a multiple of four.
pub fn pad4(len: usize) -> usize {
    (4 - len % 4) % 4
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewcHeader {
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u32,
    pub mtime: u32,
    pub filesize: u32,
    pub devmajor: u32,
    pub devminor: u32,
    pub rdevmajor: u32,
    pub rdevminor: u32,
    pub namesize: u32,
    pub check: u32,
}

impl NewcHeader {
    /// Header for a record written by this tool: uid, gid, mtime and device
    /// numbers are all zero and nlink is always 1, directories included.
    pub fn new(ino: u32, mode: u32, filesize: u32, name: &str) -> Self {
        Self {
            ino,
            mode,
            nlink: 1,
            filesize,
            namesize: name.len() as u32 + 1,
            ..Self::default()
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        reader
            .read_exact(&mut buf)
            .map_err(Error::truncated("cpio header"))?;
        if &buf[..6] != NEWC_MAGIC {
            return Err(Error::format("invalid cpio magic"));
        }

        let mut fields = [0u32; FIELD_COUNT];
        for (i, field) in fields.iter_mut().enumerate() {
            let start = 6 + i * 8;
            *field = parse_hex(&buf[start..start + 8])?;
        }
        let [ino, mode, uid, gid, nlink, mtime, filesize, devmajor, devminor, rdevmajor, rdevminor, namesize, check] =
            fields;

        Ok(Self {
            ino,
            mode,
            uid,
            gid,
            nlink,
            mtime,
            filesize,
            devmajor,
            devminor,
            rdevmajor,
            rdevminor,
            namesize,
            check,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(NEWC_MAGIC)?;
        for field in [
            self.ino,
            self.mode,
            self.uid,
            self.gid,
            self.nlink,
            self.mtime,
            self.filesize,
            self.devmajor,
            self.devminor,
            self.rdevmajor,
            self.rdevminor,
            self.namesize,
            self.check,
        ] {
            write!(writer, "{field:08x}")?;
        }
        Ok(())
    }

    /// Padding after the name so that the content is 4-byte aligned.
    pub fn name_padding(&self) -> usize {
        pad4(HEADER_LEN + self.namesize as usize)
    }

    pub fn content_padding(&self) -> usize {
        pad4(self.filesize as usize)
    }
}

fn parse_hex(field: &[u8]) -> Result<u32> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| {
            Error::format(format!(
                "invalid cpio header field {:?}",
                String::from_utf8_lossy(field)
            ))
        })
}
