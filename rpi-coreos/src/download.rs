//! Fetching Fedora CoreOS images through `coreos-installer download`.

use crate::config::Config;
use crate::errors::{ProvisionError, ProvisionResult};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use rpi_hal::ProcessOps;
use std::path::{Path, PathBuf};

pub const COREOS_INSTALLER: &str = "coreos-installer";

/// Fedora CoreOS release stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stream {
    Stable,
    Testing,
    Next,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Stable => "stable",
            Stream::Testing => "testing",
            Stream::Next => "next",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static FEDORA_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^fedora-coreos-(\d+)").expect("valid regex"));

fn download_args(cache_dir: &Path, arch: &str, stream: Stream, insecure: bool) -> Vec<String> {
    let mut args = vec![
        "download".to_string(),
        "-s".to_string(),
        stream.to_string(),
        "-a".to_string(),
        arch.to_string(),
        "-C".to_string(),
        cache_dir.display().to_string(),
    ];
    if insecure {
        args.push("--insecure".to_string());
    }
    args
}

/// Download (or reuse) the metal image for `arch`/`stream` and return its local path.
///
/// coreos-installer only reports the resulting path on stdout, and capturing stdout would
/// hide its progress output. So it runs twice: once attached to the terminal, which does
/// the actual download, then once captured, which hits the cache and prints the path.
/// The second run passes `--insecure` so the cached image is not re-verified.
pub fn download_image<H: ProcessOps + ?Sized>(
    hal: &H,
    cfg: &Config,
    arch: &str,
    stream: Stream,
) -> ProvisionResult<PathBuf> {
    log::info!("⬇️ Fetching Fedora CoreOS {} image for {}", stream, arch);

    let args = download_args(&cfg.cache_dir, arch, stream, false);
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    hal.command_status(COREOS_INSTALLER, &argv, cfg.timeouts.download)?;

    let args = download_args(&cfg.cache_dir, arch, stream, true);
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = hal.command_output(COREOS_INSTALLER, &argv, cfg.timeouts.download)?;

    let image = parse_download_output(&output.stdout)?;
    log::info!("📄 Image: {}", image.display());
    Ok(image)
}

/// The image path coreos-installer printed, with surrounding whitespace removed.
pub fn parse_download_output(stdout: &[u8]) -> ProvisionResult<PathBuf> {
    let text = String::from_utf8_lossy(stdout);
    let path = text.trim();
    if path.is_empty() {
        return Err(ProvisionError::EmptyDownloadPath);
    }
    Ok(PathBuf::from(path))
}

/// Fedora major release encoded in an image name such as
/// `fedora-coreos-38.20230918.3.0-metal.aarch64.raw.xz`.
pub fn fedora_version(image: &Path) -> ProvisionResult<String> {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ProvisionError::UnrecognizedImageFilename(image.display().to_string()))?;

    FEDORA_VERSION_RE
        .captures(&name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ProvisionError::UnrecognizedImageFilename(name.clone()))
}
