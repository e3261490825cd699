//! cpio "newc" archives, as used for Android ramdisks.
//!
//! - `newc` - the 110-byte header record
//! - `manifest` - the textual archive manifest (`cpiolist.txt`)
//! - `list` - build a manifest from a directory tree
//!
//! [`parse`] extracts an archive under a root directory and returns the
//! manifest describing it. [`serialize`] goes the other way: it writes an
//! archive from a manifest, reading file content from the paths the manifest
//! names. The writer reproduces Android's `mkbootfs` output byte for byte,
//! which means a few departures from generic cpio (see [`serialize`]).

pub mod list;
pub mod manifest;
pub mod newc;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Diagnostic, Error, Result};

pub use list::list_directory;
pub use manifest::{ArchiveManifest, EntryData, ManifestEntry};
pub use newc::{NewcHeader, TRAILER_NAME};

/// First inode number handed out by the writer.
pub const FIRST_INODE: u32 = 300_000;

/// Mode of the trailer record. Android writes 0644 without any type bits.
pub const TRAILER_MODE: u32 = 0o644;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Character or block device.
    Device,
    Pipe,
    Socket,
}

impl EntryKind {
    /// Decode the file-type bits of a mode.
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            S_IFREG => Some(Self::File),
            S_IFDIR => Some(Self::Directory),
            S_IFLNK => Some(Self::Symlink),
            S_IFCHR | S_IFBLK => Some(Self::Device),
            S_IFIFO => Some(Self::Pipe),
            S_IFSOCK => Some(Self::Socket),
            _ => None,
        }
    }

    pub fn type_bits(self) -> u32 {
        match self {
            Self::File => S_IFREG,
            Self::Directory => S_IFDIR,
            Self::Symlink => S_IFLNK,
            Self::Device => S_IFCHR,
            Self::Pipe => S_IFIFO,
            Self::Socket => S_IFSOCK,
        }
    }

    /// Record tag used in the manifest.
    pub fn tag(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Symlink => "slink",
            Self::Device => "nod",
            Self::Pipe => "pipe",
            Self::Socket => "sock",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "file" => Some(Self::File),
            "dir" => Some(Self::Directory),
            "slink" => Some(Self::Symlink),
            "nod" => Some(Self::Device),
            "pipe" => Some(Self::Pipe),
            "sock" => Some(Self::Socket),
            _ => None,
        }
    }
}

/// Normalize an archive name: forward slashes, one leading slash stripped,
/// `.` and `..` segments collapsed. `..` never climbs above the root.
/// An empty result becomes `.`.
pub fn normalize_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    let name = name.strip_prefix('/').unwrap_or(&name);

    let mut parts: Vec<&str> = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Result of extracting an archive.
#[derive(Debug, Clone, Default)]
pub struct Unpacked {
    pub manifest: ArchiveManifest,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract a newc archive under `root`, returning the manifest of what was
/// found. The manifest's `compress_level` is left unset; the caller knows
/// whether the stream was compressed.
///
/// Files and directories are created on disk, symlinks too on Unix.
/// Devices, pipes and sockets are skipped with a diagnostic, as are later
/// entries reusing an earlier name.
///
/// Nothing is written through a symlink. Symlinks are only created once the
/// trailer has been read, and any entry whose path under `root` passes
/// through an existing symlink is skipped with a diagnostic.
pub fn parse<R: Read>(reader: &mut R, root: &Path) -> Result<Unpacked> {
    let mut out = Unpacked::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut links: Vec<(String, String)> = Vec::new();

    loop {
        let header = NewcHeader::read_from(reader)?;
        if header.namesize == 0 {
            return Err(Error::format("cpio entry with empty name"));
        }

        let mut name = read_exact_len(reader, u64::from(header.namesize), "cpio entry name")?;
        name.pop();
        skip(reader, header.name_padding() as u64, "cpio entry name")?;
        let raw_name = String::from_utf8(name)
            .map_err(|_| Error::format("cpio entry name is not valid UTF-8"))?;

        if raw_name == TRAILER_NAME {
            break;
        }

        let name = normalize_name(&raw_name);
        let path = root.join(&name);
        let size = u64::from(header.filesize);
        let perm = header.mode & 0o7777;
        let padding = header.content_padding() as u64;

        if !seen.insert(name.clone()) {
            out.diagnostics
                .push(Diagnostic::NameCollision { name }.emit());
            skip(reader, size + padding, "cpio entry content")?;
            continue;
        }

        let kind = EntryKind::from_mode(header.mode);
        if matches!(kind, Some(EntryKind::File | EntryKind::Directory))
            && through_symlink(root, &name)
        {
            out.diagnostics
                .push(Diagnostic::UnsafePath { name }.emit());
            skip(reader, size + padding, "cpio entry content")?;
            continue;
        }

        match kind {
            Some(EntryKind::Symlink) => {
                let target = read_exact_len(reader, size, "symlink target")?;
                skip(reader, padding, "cpio entry content")?;
                let target = String::from_utf8(target)
                    .map_err(|_| Error::format(format!("symlink target of {name:?} is not UTF-8")))?;
                log::debug!("slink {name} -> {target}");
                links.push((name.clone(), target.clone()));
                out.manifest
                    .entries
                    .push(ManifestEntry::symlink(name, target, perm));
            }
            Some(EntryKind::Directory) => {
                fs::create_dir_all(&path).map_err(|e| Error::File(path.clone(), e))?;
                skip(reader, size + padding, "cpio entry content")?;
                log::debug!("dir {name}");
                out.manifest.entries.push(ManifestEntry::directory(name, perm));
            }
            Some(EntryKind::File) => {
                write_file(reader, &path, size)?;
                skip(reader, padding, "cpio entry content")?;
                log::debug!("file {name} ({size} bytes)");
                out.manifest.entries.push(ManifestEntry::file(name, path, perm));
            }
            kind => {
                skip(reader, size + padding, "cpio entry content")?;
                out.diagnostics
                    .push(Diagnostic::UnsupportedEntryKind { name, kind }.emit());
            }
        }
    }

    for (name, target) in links {
        let path = root.join(&name);
        if through_symlink(root, &name) || path.symlink_metadata().is_ok() {
            out.diagnostics
                .push(Diagnostic::UnsafePath { name: name.clone() }.emit());
            out.manifest.entries.retain(|e| e.name != name);
            continue;
        }
        make_symlink(&target, &path)?;
    }

    Ok(out)
}

/// Whether `name` under `root` passes through an existing symlink, the last
/// component included.
fn through_symlink(root: &Path, name: &str) -> bool {
    let mut path = root.to_path_buf();
    for part in name.split('/') {
        path.push(part);
        match path.symlink_metadata() {
            Ok(meta) if meta.file_type().is_symlink() => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    false
}

/// Write a newc archive for `manifest` to `writer`.
///
/// Relative file sources are resolved against `source_root`. Records get
/// inode numbers counting up from [`FIRST_INODE`]; every accepted record
/// consumes one, even if it is then skipped (missing source, unsupported
/// kind), and the trailer takes the next. Like Android's `mkbootfs`,
/// directories carry nlink 1 and the trailer's mode is a bare 0644. With
/// `pad_trailer`, the archive is zero-padded to a 512-byte boundary.
pub fn serialize<W: Write>(
    manifest: &ArchiveManifest,
    source_root: &Path,
    writer: &mut W,
    pad_trailer: bool,
) -> Result<Vec<Diagnostic>> {
    let mut out = CountingWriter::new(writer);
    let mut diagnostics = Vec::new();
    let mut written: HashSet<String> = HashSet::new();
    let mut ino = FIRST_INODE;

    for entry in &manifest.entries {
        let name = normalize_name(&entry.name);
        if !written.insert(name.clone()) {
            diagnostics.push(Diagnostic::NameCollision { name }.emit());
            continue;
        }

        let mode = (entry.mode & 0o7777) | entry.kind().type_bits();
        match &entry.data {
            EntryData::Directory => {
                write_record(&mut out, NewcHeader::new(ino, mode, 0, &name), &name)?;
            }
            EntryData::Symlink { target } => {
                let header = NewcHeader::new(ino, mode, content_len(target.len())?, &name);
                write_record(&mut out, header, &name)?;
                out.write_all(target.as_bytes())?;
                write_padding(&mut out, newc::pad4(target.len()))?;
            }
            EntryData::File { source } => {
                let path = resolve_source(source_root, source);
                match File::open(&path) {
                    Ok(mut file) => {
                        let len = file
                            .metadata()
                            .map_err(|e| Error::File(path.clone(), e))?
                            .len();
                        let header = NewcHeader::new(ino, mode, content_len(len as usize)?, &name);
                        write_record(&mut out, header, &name)?;
                        let copied = io::copy(&mut (&mut file).take(len), &mut out)
                            .map_err(|e| Error::File(path.clone(), e))?;
                        if copied != len {
                            return Err(Error::File(
                                path,
                                io::Error::new(
                                    io::ErrorKind::UnexpectedEof,
                                    "file shrank while being archived",
                                ),
                            ));
                        }
                        write_padding(&mut out, newc::pad4(len as usize))?;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        diagnostics.push(Diagnostic::MissingSourceFile { name, path }.emit());
                    }
                    Err(e) => return Err(Error::File(path, e)),
                }
            }
            EntryData::Unsupported(kind) => {
                diagnostics.push(
                    Diagnostic::UnsupportedEntryKind {
                        name,
                        kind: Some(*kind),
                    }
                    .emit(),
                );
            }
        }
        ino += 1;
    }

    write_record(
        &mut out,
        NewcHeader::new(ino, TRAILER_MODE, 0, TRAILER_NAME),
        TRAILER_NAME,
    )?;
    if pad_trailer {
        let pad = (512 - out.count % 512) % 512;
        write_padding(&mut out, pad as usize)?;
    }
    out.flush()?;

    Ok(diagnostics)
}

fn write_record<W: Write>(out: &mut W, header: NewcHeader, name: &str) -> Result<()> {
    header.write_to(out)?;
    out.write_all(name.as_bytes())?;
    out.write_all(&[0])?;
    write_padding(out, header.name_padding())?;
    Ok(())
}

fn write_padding<W: Write>(out: &mut W, len: usize) -> io::Result<()> {
    const ZEROS: [u8; 512] = [0; 512];
    out.write_all(&ZEROS[..len])
}

fn content_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::validation("cpio entry larger than 4 GiB"))
}

fn resolve_source(root: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        root.join(source)
    }
}

fn skip<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped != len {
        return Err(Error::format(format!("truncated {what}")));
    }
    Ok(())
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
fn read_exact_len<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(Error::format(format!("truncated {what}")));
    }
    Ok(buf)
}

fn write_file<R: Read>(reader: &mut R, path: &Path, len: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::File(parent.to_path_buf(), e))?;
    }
    let mut file = File::create(path).map_err(|e| Error::File(path.to_path_buf(), e))?;
    let copied = io::copy(&mut reader.by_ref().take(len), &mut file)
        .map_err(|e| Error::File(path.to_path_buf(), e))?;
    if copied != len {
        return Err(Error::format(format!(
            "truncated content for {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::File(parent.to_path_buf(), e))?;
    }
    std::os::unix::fs::symlink(target, path).map_err(|e| Error::File(path.to_path_buf(), e))
}

#[cfg(not(unix))]
fn make_symlink(_target: &str, _path: &Path) -> Result<()> {
    Ok(())
}

/// Write adapter that tracks the archive offset for trailer padding.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("/init"), "init");
        assert_eq!(normalize_name("sbin/./adbd"), "sbin/adbd");
        assert_eq!(normalize_name("a/b/../c"), "a/c");
        assert_eq!(normalize_name("../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_name("dir\\file"), "dir/file");
        assert_eq!(normalize_name("."), ".");
        assert_eq!(normalize_name(""), ".");
    }

    #[test]
    fn test_kind_from_mode() {
        assert_eq!(EntryKind::from_mode(0o100644), Some(EntryKind::File));
        assert_eq!(EntryKind::from_mode(0o040755), Some(EntryKind::Directory));
        assert_eq!(EntryKind::from_mode(0o120777), Some(EntryKind::Symlink));
        assert_eq!(EntryKind::from_mode(0o060600), Some(EntryKind::Device));
        assert_eq!(EntryKind::from_mode(0o010644), Some(EntryKind::Pipe));
        assert_eq!(EntryKind::from_mode(0o644), None);
    }

    #[test]
    fn test_empty_archive_is_trailer_only() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        let diags = serialize(&ArchiveManifest::default(), tmp.path(), &mut buf, false).unwrap();
        assert!(diags.is_empty());
        // 110-byte header + "TRAILER!!!\0" (11) + 3 bytes padding.
        assert_eq!(buf.len(), 124);
        let header = NewcHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(header.ino, FIRST_INODE);
        // Known quirk: the trailer mode has no type bits.
        assert_eq!(header.mode, TRAILER_MODE);
    }

    #[test]
    fn test_trailer_padding_to_512() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        serialize(&ArchiveManifest::default(), tmp.path(), &mut buf, true).unwrap();
        assert_eq!(buf.len(), 512);
        assert!(buf[124..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_directory_nlink_is_one() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = ArchiveManifest::default();
        manifest.push(ManifestEntry::directory("sbin", 0o750));

        let mut buf = Vec::new();
        serialize(&manifest, tmp.path(), &mut buf, false).unwrap();
        let header = NewcHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(header.mode, 0o040750);
        // Known quirk: Android writes nlink 1 for directories, not 2.
        assert_eq!(header.nlink, 1);
        assert_eq!((header.uid, header.gid, header.mtime), (0, 0, 0));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let tmp = TempDir::new().unwrap();
        let manifest: ArchiveManifest = "dir\ta\t755\ndir\ta\t750\n".parse().unwrap();

        let mut buf = Vec::new();
        let diags = serialize(&manifest, tmp.path(), &mut buf, false).unwrap();
        assert_eq!(
            diags,
            vec![Diagnostic::NameCollision { name: "a".into() }]
        );

        let dest = tmp.path().join("out");
        let unpacked = parse(&mut Cursor::new(buf), &dest).unwrap();
        assert_eq!(unpacked.manifest.entries.len(), 1);
        assert_eq!(unpacked.manifest.entries[0], ManifestEntry::directory("a", 0o755));
    }

    #[test]
    fn test_missing_source_is_skipped_but_consumes_inode() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = ArchiveManifest::default();
        manifest.push(ManifestEntry::file("gone", "does/not/exist", 0o644));
        manifest.push(ManifestEntry::directory("kept", 0o755));

        let mut buf = Vec::new();
        let diags = serialize(&manifest, tmp.path(), &mut buf, false).unwrap();
        assert!(matches!(
            diags.as_slice(),
            [Diagnostic::MissingSourceFile { .. }]
        ));

        let header = NewcHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(header.ino, FIRST_INODE + 1);
    }

    #[test]
    fn test_truncated_archive() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        NewcHeader::new(1, 0o100644, 100, "big").write_to(&mut buf).unwrap();
        buf.extend_from_slice(b"big\0");
        buf.extend_from_slice(b"only a few bytes");
        let err = parse(&mut Cursor::new(buf), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    /// Append one hand-built newc record to `buf`.
    fn record(buf: &mut Vec<u8>, mode: u32, name: &str, content: &[u8]) {
        let header = NewcHeader::new(1, mode, content.len() as u32, name);
        header.write_to(buf).unwrap();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        buf.resize(buf.len() + header.name_padding(), 0);
        buf.extend_from_slice(content);
        buf.resize(buf.len() + header.content_padding(), 0);
    }

    fn trailer(buf: &mut Vec<u8>) {
        record(buf, TRAILER_MODE, TRAILER_NAME, b"");
    }

    #[test]
    fn test_device_entry_is_skipped_with_content() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        record(&mut buf, 0o020644, "dev/x", b"abcde");
        record(&mut buf, 0o100644, "a", b"hello");
        trailer(&mut buf);

        let unpacked = parse(&mut Cursor::new(buf), tmp.path()).unwrap();
        assert_eq!(
            unpacked.diagnostics,
            vec![Diagnostic::UnsupportedEntryKind {
                name: "dev/x".into(),
                kind: Some(EntryKind::Device),
            }]
        );
        assert_eq!(unpacked.manifest.entries.len(), 1);
        assert_eq!(unpacked.manifest.entries[0].name, "a");
        assert_eq!(fs::read(tmp.path().join("a")).unwrap(), b"hello");
        assert!(!tmp.path().join("dev/x").exists());
    }

    #[test]
    fn test_parse_duplicate_file_keeps_first_content() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        record(&mut buf, 0o100644, "a", b"first");
        record(&mut buf, 0o100600, "/a", b"second!");
        record(&mut buf, 0o100644, "b", b"b");
        trailer(&mut buf);

        let unpacked = parse(&mut Cursor::new(buf), tmp.path()).unwrap();
        assert_eq!(
            unpacked.diagnostics,
            vec![Diagnostic::NameCollision { name: "a".into() }]
        );
        assert_eq!(unpacked.manifest.entries.len(), 2);
        assert_eq!(unpacked.manifest.entries[0].mode, 0o644);
        assert_eq!(fs::read(tmp.path().join("a")).unwrap(), b"first");
        assert_eq!(fs::read(tmp.path().join("b")).unwrap(), b"b");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_under_archive_symlink_stays_inside_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();

        let mut buf = Vec::new();
        record(&mut buf, 0o120777, "evil", outside.to_str().unwrap().as_bytes());
        record(&mut buf, 0o100644, "evil/pwned", b"owned");
        trailer(&mut buf);

        let unpacked = parse(&mut Cursor::new(buf), &root).unwrap();
        assert!(!outside.join("pwned").exists());
        assert_eq!(fs::read(root.join("evil/pwned")).unwrap(), b"owned");
        // The link would replace a real directory, so it is dropped.
        assert!(!root.join("evil").symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(
            unpacked.diagnostics,
            vec![Diagnostic::UnsafePath { name: "evil".into() }]
        );
        assert!(!unpacked.manifest.contains("evil"));
        assert!(unpacked.manifest.contains("evil/pwned"));
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_symlink_in_root_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("etc")).unwrap();

        let mut buf = Vec::new();
        record(&mut buf, 0o040755, "etc/init", b"");
        record(&mut buf, 0o100644, "etc/foo", b"x");
        record(&mut buf, 0o100644, "ok", b"y");
        trailer(&mut buf);

        let unpacked = parse(&mut Cursor::new(buf), &root).unwrap();
        assert!(fs::read_dir(&outside).unwrap().next().is_none());
        assert_eq!(
            unpacked.diagnostics,
            vec![
                Diagnostic::UnsafePath { name: "etc/init".into() },
                Diagnostic::UnsafePath { name: "etc/foo".into() },
            ]
        );
        assert_eq!(unpacked.manifest.entries.len(), 1);
        assert_eq!(fs::read(root.join("ok")).unwrap(), b"y");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_created_after_trailer() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        record(&mut buf, 0o120777, "init", b"sbin/adbd");
        record(&mut buf, 0o100755, "sbin/adbd", b"bin");
        trailer(&mut buf);

        let unpacked = parse(&mut Cursor::new(buf), tmp.path()).unwrap();
        assert!(unpacked.diagnostics.is_empty());
        assert_eq!(unpacked.manifest.entries[0].name, "init");
        assert_eq!(
            fs::read_link(tmp.path().join("init")).unwrap(),
            Path::new("sbin/adbd")
        );
    }

    #[test]
    fn test_oversized_symlink_target_is_truncation() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        let header = NewcHeader::new(1, 0o120777, u32::MAX, "l");
        header.write_to(&mut buf).unwrap();
        buf.extend_from_slice(b"l\0");
        buf.resize(buf.len() + header.name_padding(), 0);
        buf.extend_from_slice(b"short");

        let err = parse(&mut Cursor::new(buf), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m == "truncated symlink target"));
    }

    #[test]
    fn test_oversized_name_is_truncation() {
        let tmp = TempDir::new().unwrap();
        let mut buf = Vec::new();
        let mut header = NewcHeader::new(1, 0o100644, 0, "n");
        header.namesize = u32::MAX;
        header.write_to(&mut buf).unwrap();
        buf.extend_from_slice(b"n\0");

        let err = parse(&mut Cursor::new(buf), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m == "truncated cpio entry name"));
    }
}
