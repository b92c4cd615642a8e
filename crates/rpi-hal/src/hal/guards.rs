use crate::{HalResult, MountOps};
use std::path::{Path, PathBuf};

/// RAII guard that unmounts a target path when dropped.
///
/// Prefer [`MountGuard::finish`] on the success path so an unmount failure is reported to
/// the caller; `Drop` only covers early returns and panics, and can merely log.
#[derive(Debug)]
pub struct MountGuard<'a, H: MountOps + ?Sized> {
    hal: &'a H,
    target: PathBuf,
    active: bool,
}

impl<'a, H: MountOps + ?Sized> MountGuard<'a, H> {
    pub fn new(hal: &'a H, target: impl Into<PathBuf>) -> Self {
        Self {
            hal,
            target: target.into(),
            active: true,
        }
    }

    /// Unmount now and return the result.
    pub fn finish(mut self) -> HalResult<()> {
        self.active = false;
        self.hal.unmount(&self.target)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl<'a, H: MountOps + ?Sized> Drop for MountGuard<'a, H> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.hal.unmount(&self.target) {
            log::warn!(
                "mount guard failed to unmount {}: {}",
                self.target.display(),
                err
            );
        }
    }
}
