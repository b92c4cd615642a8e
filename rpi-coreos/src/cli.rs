//! CLI argument parsing for rpi-coreos.

use crate::download::Stream;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rpi-coreos")]
#[command(version, about = "🥧 Write Fedora CoreOS to Raspberry Pi boot media")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Cache directory for images and package roots
    /// (default: $XDG_CACHE_HOME/rpi-coreos or ~/.cache/rpi-coreos)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log every external command
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never prefix privileged commands with sudo
    #[arg(long, global = true)]
    pub no_sudo: bool,
}

/// Target selection shared by the commands that write a device.
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Target block device (e.g., /dev/sda). Everything on it is overwritten.
    #[arg(long)]
    pub device: PathBuf,

    /// CPU architecture of the image
    #[arg(long, default_value = "aarch64")]
    pub arch: String,

    /// Fedora CoreOS stream
    #[arg(long, value_enum, default_value = "stable")]
    pub stream: Stream,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 💾 Write the image and add Raspberry Pi firmware to its EFI partition
    Install {
        #[command(flatten)]
        target: TargetArgs,

        /// Raspberry Pi hardware revision (selects the U-Boot build, e.g. 3 or 4)
        #[arg(long = "rpi", default_value = "4")]
        rpi_revision: String,
    },

    /// 📀 Write the image only, without Raspberry Pi firmware
    Write {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// ⬇️ Download the image into the cache and print its path
    Download {
        #[arg(long, default_value = "aarch64")]
        arch: String,

        #[arg(long, value_enum, default_value = "stable")]
        stream: Stream,
    },

    /// 📦 Build (or refresh) the firmware package root and print its path
    BuildRoot {
        /// Fedora release the packages come from (e.g. 38)
        #[arg(long)]
        fedora_version: String,

        #[arg(long, default_value = "aarch64")]
        arch: String,
    },

    /// 🔍 Check that the required tools are installed
    Preflight,
}
