use rpi_hal::HalError;
use std::path::PathBuf;
use thiserror::Error;

pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot prepare cache directory {}: {source}", .path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine a home directory for the default cache location")]
    NoHomeDirectory,

    #[error("Target device must be an absolute /dev path: {}", .0.display())]
    InvalidDevice(PathBuf),

    #[error("coreos-installer download printed no image path")]
    EmptyDownloadPath,

    #[error("Image filename does not look like fedora-coreos-<version>...: {0}")]
    UnrecognizedImageFilename(String),

    #[error("No partition labeled EFI-SYSTEM found on {}", .device.display())]
    NoEfiPartitionFound { device: PathBuf },

    #[error("Required binary '{0}' not found in PATH")]
    MissingBinary(String),

    #[error("Required binary '{name}' was found at {} but is not executable", .path.display())]
    NotExecutable { name: String, path: PathBuf },
}
