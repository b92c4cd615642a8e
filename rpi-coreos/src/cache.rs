//! Per-user cache directory for downloaded images and provisioned roots.

use crate::errors::{ProvisionError, ProvisionResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "rpi-coreos";

/// Base cache location: `$XDG_CACHE_HOME` when set and non-empty, else `<home>/.cache`.
pub fn cache_base(
    xdg_cache_home: Option<OsString>,
    home: Option<PathBuf>,
) -> ProvisionResult<PathBuf> {
    match xdg_cache_home.filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => home
            .map(|h| h.join(".cache"))
            .ok_or(ProvisionError::NoHomeDirectory),
    }
}

/// Cache directory for this process: `explicit` if given, else `<base>/rpi-coreos`.
///
/// The directory is created and returned canonicalized; it gets bind-mounted into a
/// container, which needs an absolute path.
pub fn resolve_cache_dir(explicit: Option<&Path>) -> ProvisionResult<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => cache_base(std::env::var_os("XDG_CACHE_HOME"), dirs::home_dir())?.join(APP_NAME),
    };
    ensure_dir(&dir)
}

pub fn ensure_dir(dir: &Path) -> ProvisionResult<PathBuf> {
    let cache_err = |source| ProvisionError::CacheDir {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(cache_err)?;
    fs::canonicalize(dir).map_err(cache_err)
}
