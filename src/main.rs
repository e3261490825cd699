//! bootimg - unpack and repack Android boot images.
//!
//! Works on a directory layout (`bootinfo.txt`, section files,
//! `cpiolist.txt` and the extracted ramdisk tree) that can be edited by hand
//! between an unpack and a repack.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bootimg::bootimg::info::parse_hex;
use bootimg::config::Config;
use bootimg::workflow::RepackOptions;

#[derive(Parser)]
#[command(name = "bootimg")]
#[command(about = "Android boot image unpacker/repacker")]
#[command(
    after_help = "QUICK START:\n  bootimg unpack-bootimg boot.img  Unpack into the work directory\n  bootimg repack-bootimg           Rebuild boot-new.img\n  bootimg info boot.img            Show header fields"
)]
struct Cli {
    /// Work directory holding bootinfo.txt, cpiolist.txt and sections
    #[arg(short, long, global = true, default_value = ".")]
    work_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack a boot image (default: boot.img or recovery.img)
    UnpackBootimg {
        image: Option<PathBuf>,
        /// Directory the ramdisk is extracted to (default: initrd)
        #[arg(long)]
        ramdisk_dir: Option<String>,
    },

    /// Rebuild a boot image from the work directory
    RepackBootimg {
        /// Load base address, hex
        #[arg(long, value_parser = hex_arg)]
        base: Option<u32>,
        /// Kernel command line
        #[arg(long)]
        cmdline: Option<String>,
        /// Header page size, hex
        #[arg(long, value_parser = hex_arg)]
        page_size: Option<u32>,
        /// Section padding size, hex
        #[arg(long, value_parser = hex_arg)]
        padding_size: Option<u32>,
        /// Output image (default: boot-new.img)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unpack a standalone ramdisk (default: ramdisk.gz)
    UnpackRamdisk {
        ramdisk: Option<PathBuf>,
        /// Destination directory (default: initrd)
        dir: Option<PathBuf>,
    },

    /// Rebuild ramdisk.cpio.gz from a manifest (default: cpiolist.txt)
    RepackRamdisk { manifest: Option<PathBuf> },

    /// Print a cpiolist.txt manifest for a directory tree
    List { dir: PathBuf },

    /// Show boot image header fields
    Info {
        image: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    ShowConfig,
}

fn hex_arg(text: &str) -> std::result::Result<u32, String> {
    parse_hex(text).ok_or_else(|| format!("not a hex number: {text}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::load(&cli.work_dir);
    let work_dir = cli.work_dir.as_path();

    match cli.command {
        Commands::UnpackBootimg { image, ramdisk_dir } => {
            let ramdisk_dir = ramdisk_dir.unwrap_or_else(|| config.ramdisk_dir.clone());
            commands::cmd_unpack_bootimg(work_dir, image.as_deref(), &ramdisk_dir)?;
        }
        Commands::RepackBootimg {
            base,
            cmdline,
            page_size,
            padding_size,
            output,
        } => {
            let options = RepackOptions {
                base,
                cmdline,
                page_size,
                padding_size,
                manifest: None,
                output,
            };
            commands::cmd_repack_bootimg(work_dir, &options, &config)?;
        }
        Commands::UnpackRamdisk { ramdisk, dir } => {
            let dir = dir.unwrap_or_else(|| work_dir.join(&config.ramdisk_dir));
            commands::cmd_unpack_ramdisk(work_dir, ramdisk.as_deref(), &dir)?;
        }
        Commands::RepackRamdisk { manifest } => {
            commands::cmd_repack_ramdisk(work_dir, manifest.as_deref(), &config)?;
        }
        Commands::List { dir } => {
            commands::cmd_list(&dir)?;
        }
        Commands::Info { image, json } => {
            commands::cmd_info(&image, json)?;
        }
        Commands::ShowConfig => {
            config.print();
        }
    }

    Ok(())
}
