//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `unpack` - Unpack a boot image or ramdisk into the work directory
//! - `repack` - Rebuild a ramdisk or boot image from the work directory
//! - `list` - Print a manifest for a directory tree
//! - `info` - Show boot image header fields

mod info;
mod list;
pub mod repack;
pub mod unpack;

use bootimg::Diagnostic;

pub use info::cmd_info;
pub use list::cmd_list;
pub use repack::{cmd_repack_bootimg, cmd_repack_ramdisk};
pub use unpack::{cmd_unpack_bootimg, cmd_unpack_ramdisk};

/// Print a trailing warning block if anything was skipped or unusual.
fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!();
    println!("Warnings ({}):", diagnostics.len());
    for diagnostic in diagnostics {
        println!("  - {diagnostic}");
    }
}
