//! The 608-byte boot image header.
//!
//! ```text
//! 8s     magic "ANDROID!"
//! 10*u32 kernel_size kernel_addr ramdisk_size ramdisk_addr second_size
//!        second_addr tags_addr page_size dt_size reserved
//! 16s    board name
//! 512s   kernel command line
//! 32s    id (SHA-1 digest, zero padded)
//! ```
//!
//! All integers are little-endian.

use crate::error::{Diagnostic, Error, Result};
use crate::mtk::trim_nul;

pub const BOOT_MAGIC: &[u8; 8] = b"ANDROID!";
pub const HEADER_SIZE: usize = 608;
pub const BOARD_NAME_SIZE: usize = 16;
pub const CMDLINE_SIZE: usize = 512;
pub const ID_SIZE: usize = 32;

/// Standard load offsets relative to `base`.
pub const KERNEL_OFFSET: u32 = 0x0000_8000;
pub const RAMDISK_OFFSET: u32 = 0x0100_0000;
pub const SECOND_OFFSET: u32 = 0x00f0_0000;
pub const TAGS_OFFSET: u32 = 0x0000_0100;

const NAME_AT: usize = 48;
const CMDLINE_AT: usize = NAME_AT + BOARD_NAME_SIZE;
const ID_AT: usize = CMDLINE_AT + CMDLINE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImageHeader {
    pub kernel_size: u32,
    pub kernel_addr: u32,
    pub ramdisk_size: u32,
    pub ramdisk_addr: u32,
    pub second_size: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    pub dt_size: u32,
    /// Board name, cut at the first NUL.
    pub name: String,
    /// Kernel command line, cut at the first NUL.
    pub cmdline: String,
    pub id: [u8; ID_SIZE],
}

impl BootImageHeader {
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if &buf[..8] != BOOT_MAGIC {
            return Err(Error::format("invalid boot image magic"));
        }

        let word = |i: usize| {
            let at = 8 + i * 4;
            u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
        };
        let text = |range: std::ops::Range<usize>| {
            String::from_utf8_lossy(trim_nul(&buf[range])).into_owned()
        };

        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&buf[ID_AT..]);

        Ok(Self {
            kernel_size: word(0),
            kernel_addr: word(1),
            ramdisk_size: word(2),
            ramdisk_addr: word(3),
            second_size: word(4),
            second_addr: word(5),
            tags_addr: word(6),
            page_size: word(7),
            dt_size: word(8),
            // word(9) is reserved and always written as zero.
            name: text(NAME_AT..CMDLINE_AT),
            cmdline: text(CMDLINE_AT..ID_AT),
            id,
        })
    }

    /// Pack the header. Fails if the name or command line does not fit.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        check_fields(&self.name, &self.cmdline)?;

        let mut buf = [0u8; HEADER_SIZE];
        buf[..8].copy_from_slice(BOOT_MAGIC);
        let words = [
            self.kernel_size,
            self.kernel_addr,
            self.ramdisk_size,
            self.ramdisk_addr,
            self.second_size,
            self.second_addr,
            self.tags_addr,
            self.page_size,
            self.dt_size,
            0,
        ];
        for (i, word) in words.iter().enumerate() {
            let at = 8 + i * 4;
            buf[at..at + 4].copy_from_slice(&word.to_le_bytes());
        }
        buf[NAME_AT..NAME_AT + self.name.len()].copy_from_slice(self.name.as_bytes());
        buf[CMDLINE_AT..CMDLINE_AT + self.cmdline.len()].copy_from_slice(self.cmdline.as_bytes());
        buf[ID_AT..].copy_from_slice(&self.id);
        Ok(buf)
    }

    /// Load base derived from the kernel address.
    pub fn base(&self) -> u32 {
        self.kernel_addr.wrapping_sub(KERNEL_OFFSET)
    }

    /// Addresses that do not sit at the standard offset from [`base`](Self::base).
    /// These are reported, never corrected.
    pub fn address_diagnostics(&self) -> Vec<Diagnostic> {
        let base = self.base();
        [
            ("ramdisk_addr", self.ramdisk_addr, RAMDISK_OFFSET),
            ("second_addr", self.second_addr, SECOND_OFFSET),
            ("tags_addr", self.tags_addr, TAGS_OFFSET),
        ]
        .into_iter()
        .filter_map(|(field, actual, offset)| {
            let expected = base.wrapping_add(offset);
            (actual != expected).then_some(Diagnostic::AddressConvention {
                field,
                expected,
                actual,
            })
        })
        .collect()
    }

    /// First 20 bytes of the id: the SHA-1 digest.
    pub fn digest(&self) -> &[u8] {
        &self.id[..20]
    }
}

pub(crate) fn check_fields(name: &str, cmdline: &str) -> Result<()> {
    if name.len() > BOARD_NAME_SIZE {
        return Err(Error::validation(format!(
            "board name {name:?} exceeds {BOARD_NAME_SIZE} bytes"
        )));
    }
    if cmdline.len() > CMDLINE_SIZE {
        return Err(Error::validation(format!(
            "kernel command line exceeds {CMDLINE_SIZE} bytes ({} bytes)",
            cmdline.len()
        )));
    }
    Ok(())
}
