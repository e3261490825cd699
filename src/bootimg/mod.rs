//! Android boot images (header version 0).
//!
//! - `header` - the 608-byte header
//! - `padding` - section alignment and padding-size discovery
//! - `info` - the `bootinfo.txt` sidecar
//!
//! An image is the header followed by up to four sections, each padded to
//! a multiple of the padding size:
//!
//! ```text
//! header | kernel | ramdisk | second (optional) | device tree (optional)
//! ```
//!
//! Parsing hands back a [`ParsedImage`] holding everything needed to rebuild
//! an equivalent image; nothing is kept between calls.

pub mod header;
pub mod info;
pub mod padding;

use std::io::{Read, Seek, SeekFrom, Write};

use sha1::{Digest, Sha1};

use crate::error::{Diagnostic, Error, Result};
use crate::gzip;

pub use header::{BootImageHeader, HEADER_SIZE};
pub use info::BootInfo;
pub use padding::{discover_padding_size, padding};

use header::{ID_SIZE, KERNEL_OFFSET, RAMDISK_OFFSET, SECOND_OFFSET, TAGS_OFFSET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Kernel,
    Ramdisk,
    Second,
    DeviceTree,
}

impl SectionKind {
    /// Base file name used when a section is extracted.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Kernel => "kernel",
            Self::Ramdisk => "ramdisk",
            Self::Second => "second",
            Self::DeviceTree => "dt_image",
        }
    }

    /// File name for a section's content: `.gz` is appended when the
    /// content starts with the gzip magic.
    pub fn file_name(self, data: &[u8]) -> String {
        if gzip::is_gzip(data) {
            format!("{}.gz", self.file_stem())
        } else {
            self.file_stem().to_string()
        }
    }
}

/// Section contents, in image order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub kernel: Vec<u8>,
    pub ramdisk: Vec<u8>,
    pub second: Option<Vec<u8>>,
    pub device_tree: Option<Vec<u8>>,
}

impl Sections {
    /// Present sections in image order. Kernel and ramdisk always count.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKind, &[u8])> {
        [
            (SectionKind::Kernel, Some(self.kernel.as_slice())),
            (SectionKind::Ramdisk, Some(self.ramdisk.as_slice())),
            (SectionKind::Second, self.second.as_deref()),
            (SectionKind::DeviceTree, self.device_tree.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, data)| data.map(|d| (kind, d)))
    }

    /// SHA-1 over kernel, ramdisk and second, each followed by its
    /// little-endian u32 size, then the device tree and its size only if one
    /// is present. Returned zero-padded to the 32-byte id field.
    pub fn compute_id(&self) -> Result<[u8; ID_SIZE]> {
        let mut sha = Sha1::new();
        let mut feed = |data: &[u8]| -> Result<()> {
            sha.update(data);
            sha.update(section_size(data)?.to_le_bytes());
            Ok(())
        };
        feed(&self.kernel)?;
        feed(&self.ramdisk)?;
        feed(self.second.as_deref().unwrap_or_default())?;
        if let Some(dt) = &self.device_tree {
            feed(dt)?;
        }

        let mut id = [0u8; ID_SIZE];
        id[..20].copy_from_slice(&sha.finalize());
        Ok(id)
    }
}

/// Everything needed to lay out an image besides its section contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageParams {
    pub base: u32,
    pub ramdisk_addr: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    pub padding_size: u32,
    pub name: String,
    pub cmdline: String,
}

impl ImageParams {
    /// Parameters with every address at its standard offset from `base`.
    pub fn standard(base: u32, page_size: u32, padding_size: u32, cmdline: &str) -> Self {
        Self {
            base,
            ramdisk_addr: base.wrapping_add(RAMDISK_OFFSET),
            second_addr: base.wrapping_add(SECOND_OFFSET),
            tags_addr: base.wrapping_add(TAGS_OFFSET),
            page_size,
            padding_size,
            name: String::new(),
            cmdline: cmdline.to_string(),
        }
    }
}

/// A parsed image together with what was learned while reading it.
#[derive(Debug, Clone)]
pub struct ParsedImage {
    pub header: BootImageHeader,
    pub sections: Sections,
    /// Measured padding quantum; may differ from `header.page_size`.
    pub padding_size: u32,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedImage {
    /// Parameters that reproduce this image's layout.
    pub fn params(&self) -> ImageParams {
        ImageParams {
            base: self.header.base(),
            ramdisk_addr: self.header.ramdisk_addr,
            second_addr: self.header.second_addr,
            tags_addr: self.header.tags_addr,
            page_size: self.header.page_size,
            padding_size: self.padding_size,
            name: self.header.name.clone(),
            cmdline: self.header.cmdline.clone(),
        }
    }

    /// The sidecar record for this image.
    pub fn boot_info(&self) -> BootInfo {
        let params = self.params();
        BootInfo {
            base: Some(params.base),
            ramdisk_addr: Some(params.ramdisk_addr),
            second_addr: Some(params.second_addr),
            tags_addr: Some(params.tags_addr),
            page_size: Some(params.page_size),
            padding_size: Some(params.padding_size),
            name: Some(params.name),
            cmdline: Some(params.cmdline),
            mode: None,
            mtk_header_name: None,
        }
    }
}

/// Parse a boot image starting at the current position of `reader`.
///
/// Address deviations from the standard layout are reported in
/// `diagnostics` and kept as read. The padding size is measured with
/// [`discover_padding_size`] before the sections are read.
pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<ParsedImage> {
    let start = reader.stream_position()?;

    let mut buf = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut buf)
        .map_err(Error::truncated("boot image header"))?;
    let header = BootImageHeader::from_bytes(&buf)?;

    if (header.page_size as usize) < HEADER_SIZE {
        return Err(Error::format(format!(
            "page size {} is smaller than the header",
            header.page_size
        )));
    }

    let diagnostics: Vec<Diagnostic> = header
        .address_diagnostics()
        .into_iter()
        .map(Diagnostic::emit)
        .collect();
    if header.dt_size > 0 {
        log::info!("Found device tree image ({} bytes)", header.dt_size);
    }

    let padding_size = discover_padding_size(reader, start, header.page_size)?;
    log::info!(
        "base: 0x{:x}, page_size: {}, padding_size: {}",
        header.base(),
        header.page_size,
        padding_size
    );

    let kernel = read_section(reader, header.kernel_size, padding_size, SectionKind::Kernel)?;
    let ramdisk = read_section(reader, header.ramdisk_size, padding_size, SectionKind::Ramdisk)?;
    let second = match header.second_size {
        0 => None,
        size => Some(read_section(reader, size, padding_size, SectionKind::Second)?),
    };
    let device_tree = match header.dt_size {
        0 => None,
        size => Some(read_section(reader, size, padding_size, SectionKind::DeviceTree)?),
    };

    Ok(ParsedImage {
        header,
        sections: Sections {
            kernel,
            ramdisk,
            second,
            device_tree,
        },
        padding_size,
        diagnostics,
    })
}

/// Write a boot image for `sections` laid out per `params`, returning the
/// header that was written.
///
/// The header is padded to `padding_size`, not `page_size`, as `mkbootimg`
/// does; the two only differ on vendor variants. Fails before writing
/// anything if a field does not fit.
pub fn serialize<W: Write>(
    params: &ImageParams,
    sections: &Sections,
    writer: &mut W,
) -> Result<BootImageHeader> {
    header::check_fields(&params.name, &params.cmdline)?;
    if params.page_size == 0 || params.padding_size == 0 {
        return Err(Error::validation("page size and padding size must be non-zero"));
    }

    let header = BootImageHeader {
        kernel_size: section_size(&sections.kernel)?,
        kernel_addr: params.base.wrapping_add(KERNEL_OFFSET),
        ramdisk_size: section_size(&sections.ramdisk)?,
        ramdisk_addr: params.ramdisk_addr,
        second_size: section_size(sections.second.as_deref().unwrap_or_default())?,
        second_addr: params.second_addr,
        tags_addr: params.tags_addr,
        page_size: params.page_size,
        dt_size: section_size(sections.device_tree.as_deref().unwrap_or_default())?,
        name: params.name.clone(),
        cmdline: params.cmdline.clone(),
        id: sections.compute_id()?,
    };
    let bytes = header.to_bytes()?;

    writer.write_all(&bytes)?;
    write_zeros(writer, padding(HEADER_SIZE as u64, params.padding_size))?;
    for (_, data) in sections.iter() {
        writer.write_all(data)?;
        write_zeros(writer, padding(data.len() as u64, params.padding_size))?;
    }
    writer.flush()?;

    Ok(header)
}

/// Serialize into a fresh buffer.
pub fn to_vec(params: &ImageParams, sections: &Sections) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    serialize(params, sections, &mut out)?;
    Ok(out)
}

fn read_section<R: Read + Seek>(
    reader: &mut R,
    size: u32,
    padding_size: u32,
    kind: SectionKind,
) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.by_ref().take(u64::from(size)).read_to_end(&mut data)?;
    if data.len() as u64 != u64::from(size) {
        return Err(Error::format(format!("truncated {}", kind.file_stem())));
    }
    let pad = padding(u64::from(size), padding_size);
    reader.seek(SeekFrom::Current(pad as i64))?;
    log::debug!("{}: {} bytes", kind.file_stem(), size);
    Ok(data)
}

fn section_size(data: &[u8]) -> Result<u32> {
    u32::try_from(data.len()).map_err(|_| Error::validation("section larger than 4 GiB"))
}

fn write_zeros<W: Write>(writer: &mut W, len: u64) -> Result<()> {
    std::io::copy(&mut std::io::repeat(0).take(len), writer)?;
    Ok(())
}
