//! Archive manifest (`cpiolist.txt`).
//!
//! The manifest is the contract between unpack and repack. Repack rebuilds
//! the archive from the manifest alone; the extracted tree is only where
//! file content is read from.
//!
//! ```text
//! mode:mtk
//! mtk_header_name:ROOTFS
//! compress_level:6
//! dir	sbin	0o750
//! file	init.rc	initrd/init.rc	0o750
//! slink	init	/system/bin/init	0o777
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::EntryKind;
use crate::error::{Error, Result};

/// What an entry carries besides its name and permission bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    Directory,
    /// Regular file whose content is read from `source` at repack time.
    File { source: PathBuf },
    Symlink { target: String },
    /// Device, pipe or socket: recorded but never written.
    Unsupported(EntryKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Archive-relative name, forward slashes, no leading slash.
    pub name: String,
    /// Permission bits only; the type bits come from `data`.
    pub mode: u32,
    pub data: EntryData,
}

impl ManifestEntry {
    pub fn directory(name: impl Into<String>, mode: u32) -> Self {
        Self {
            name: name.into(),
            mode,
            data: EntryData::Directory,
        }
    }

    pub fn file(name: impl Into<String>, source: impl Into<PathBuf>, mode: u32) -> Self {
        Self {
            name: name.into(),
            mode,
            data: EntryData::File {
                source: source.into(),
            },
        }
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>, mode: u32) -> Self {
        Self {
            name: name.into(),
            mode,
            data: EntryData::Symlink {
                target: target.into(),
            },
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.data {
            EntryData::Directory => EntryKind::Directory,
            EntryData::File { .. } => EntryKind::File,
            EntryData::Symlink { .. } => EntryKind::Symlink,
            EntryData::Unsupported(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    /// 0 = raw newc, 1..=9 = gzip level. `None` when the manifest says nothing.
    pub compress_level: Option<u32>,
    /// Wrapper mode of the ramdisk file (`mtk`), if any.
    pub mode: Option<String>,
    pub mtk_header_name: Option<String>,
    pub entries: Vec<ManifestEntry>,
}

impl ArchiveManifest {
    /// Append an entry unless one with the same name is already present.
    /// Returns `false` if the entry was dropped.
    pub fn push(&mut self, entry: ManifestEntry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Name of the MTK wrapper to restore, if the ramdisk had one.
    pub fn mtk_name(&self) -> Option<&str> {
        match self.mode.as_deref() {
            Some("mtk") => Some(self.mtk_header_name.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::File(path.to_path_buf(), e))?;
        text.parse()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|e| Error::File(path.to_path_buf(), e))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(mode) = &self.mode {
            let _ = writeln!(out, "mode:{mode}");
        }
        if let Some(name) = &self.mtk_header_name {
            let _ = writeln!(out, "mtk_header_name:{name}");
        }
        if let Some(level) = self.compress_level {
            let _ = writeln!(out, "compress_level:{level}");
        }
        for entry in &self.entries {
            let name = &entry.name;
            let mode = format_mode(entry.mode);
            let _ = match &entry.data {
                EntryData::Directory => writeln!(out, "dir\t{name}\t{mode}"),
                EntryData::File { source } => {
                    writeln!(out, "file\t{name}\t{}\t{mode}", source.display())
                }
                EntryData::Symlink { target } => writeln!(out, "slink\t{name}\t{target}\t{mode}"),
                EntryData::Unsupported(kind) => writeln!(out, "{}\t{name}\t{mode}", kind.tag()),
            };
        }
        out
    }
}

impl FromStr for ArchiveManifest {
    type Err = Error;

    /// Records are kept in order and verbatim, duplicates included; the
    /// archive writer drops later duplicates when it serializes.
    fn from_str(text: &str) -> Result<Self> {
        let mut manifest = Self::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            if !line.contains('\t') {
                if let Some((key, value)) = line.split_once(':') {
                    let value = value.trim();
                    match key.trim() {
                        "compress_level" if manifest.compress_level.is_none() => {
                            manifest.compress_level = Some(parse_level(value, line_no)?);
                        }
                        "mode" if manifest.mode.is_none() => {
                            manifest.mode = Some(value.to_string());
                        }
                        "mtk_header_name" if manifest.mtk_header_name.is_none() => {
                            manifest.mtk_header_name = Some(value.to_string());
                        }
                        _ => {}
                    }
                }
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            let Some(kind) = EntryKind::from_tag(fields[0]) else {
                log::debug!("Ignoring manifest record kind {:?}", fields[0]);
                continue;
            };
            let field = |i: usize| {
                fields.get(i).copied().ok_or_else(|| Error::Manifest {
                    line: line_no,
                    reason: format!("{} record needs at least {} fields", kind.tag(), i + 1),
                })
            };

            let name = field(1)?.replace('\\', "/");
            let entry = match kind {
                EntryKind::Directory => {
                    ManifestEntry::directory(name, parse_mode(field(2)?, line_no)?)
                }
                EntryKind::File => {
                    ManifestEntry::file(name, field(2)?, parse_mode(field(3)?, line_no)?)
                }
                EntryKind::Symlink => {
                    ManifestEntry::symlink(name, field(2)?, parse_mode(field(3)?, line_no)?)
                }
                other => ManifestEntry {
                    name,
                    mode: fields
                        .last()
                        .and_then(|m| parse_mode(m, line_no).ok())
                        .unwrap_or(0),
                    data: EntryData::Unsupported(other),
                },
            };
            manifest.entries.push(entry);
        }

        Ok(manifest)
    }
}

/// Octal permission bits as written to the manifest (`0o755`).
pub fn format_mode(mode: u32) -> String {
    format!("0o{:o}", mode & 0o7777)
}

/// Accepts `0o755`, `0755` and `755`.
pub fn parse_mode(text: &str, line: usize) -> Result<u32> {
    let text = text.trim();
    let digits = text.strip_prefix("0o").unwrap_or(text);
    u32::from_str_radix(digits, 8).map_err(|_| Error::Manifest {
        line,
        reason: format!("invalid mode {text:?}"),
    })
}

fn parse_level(text: &str, line: usize) -> Result<u32> {
    let level: i64 = text.parse().map_err(|_| Error::Manifest {
        line,
        reason: format!("invalid compress_level {text:?}"),
    })?;
    Ok(level.clamp(0, 9) as u32)
}
