use env_logger::Target;
use std::fs;
use std::io;
use std::path::PathBuf;

pub fn init(log_file: Option<PathBuf>, verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // If the requested log file cannot be opened, fall back to stderr.
    let target = log_file
        .and_then(|path| {
            (|| -> io::Result<Target> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)?;
                Ok(Target::Pipe(Box::new(file)))
            })()
            .ok()
        })
        .unwrap_or(Target::Stderr);

    // RUST_LOG still takes precedence over the default level.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(target)
        .init();
}
