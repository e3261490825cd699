//! bootimg library exports.
//!
//! Codecs for Android boot images and their ramdisks:
//! - `bootimg` - boot image header and sections
//! - `cpio` - newc archives and the `cpiolist.txt` manifest
//! - `gzip` - minimal gzip framing around raw deflate
//! - `mtk` - the 512-byte MediaTek wrapper
//! - `ramdisk` - MTK + gzip + cpio combined
//! - `workflow` - unpack/repack of a work directory

pub mod bootimg;
pub mod config;
pub mod cpio;
pub mod error;
pub mod gzip;
pub mod mtk;
pub mod ramdisk;
pub mod workflow;

pub use error::{Diagnostic, Error, Result};
