use anyhow::Context;
use clap::Parser;
use rpi_coreos::cli::{Cli, Command};
use rpi_coreos::preflight::{self, Workflow};
use rpi_coreos::provision::{self, InstallRequest};
use rpi_coreos::{download, rootfs, Config};
use rpi_hal::LinuxHal;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rpi_coreos::logging::init(cli.log_file.clone(), cli.verbose);

    let elevate = !cli.no_sudo && !rpi_hal::running_as_root();
    let cfg = Config::resolve(cli.cache_dir.as_deref(), elevate)
        .context("Failed to prepare the cache directory")?;
    log::debug!("cache directory: {}", cfg.cache_dir.display());
    let hal = LinuxHal::with_elevation(cfg.elevate);

    match &cli.command {
        Command::Install {
            target,
            rpi_revision,
        } => {
            preflight::run(Workflow::Install, cfg.elevate)?;
            let req = InstallRequest {
                arch: target.arch.clone(),
                device: target.device.clone(),
                stream: target.stream,
                rpi_revision: rpi_revision.clone(),
            };
            provision::install(&hal, &cfg, &req).with_context(|| {
                format!("Provisioning {} failed", target.device.display())
            })?;
        }
        Command::Write { target } => {
            preflight::run(Workflow::Write, cfg.elevate)?;
            provision::write(&hal, &cfg, &target.device, &target.arch, target.stream)
                .with_context(|| format!("Writing {} failed", target.device.display()))?;
        }
        Command::Download { arch, stream } => {
            preflight::run(Workflow::Download, cfg.elevate)?;
            let image = download::download_image(&hal, &cfg, arch, *stream)
                .context("Image download failed")?;
            println!("{}", image.display());
        }
        Command::BuildRoot {
            fedora_version,
            arch,
        } => {
            preflight::run(Workflow::BuildRoot, cfg.elevate)?;
            let root = rootfs::create_rpi_root(&hal, &cfg, fedora_version, arch)
                .context("Building the firmware root failed")?;
            println!("{}", root.display());
        }
        Command::Preflight => {
            preflight::run(Workflow::Install, cfg.elevate)?;
        }
    }

    Ok(())
}
