//! Mount operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for mounting and unmounting filesystems.
pub trait MountOps {
    /// Mount a device to a target path.
    ///
    /// # Arguments
    /// * `device` - Device path (e.g., `/dev/sda1`)
    /// * `target` - Mount point path
    fn mount_device(&self, device: &Path, target: &Path) -> HalResult<()>;

    /// Unmount a filesystem, given either its mount point or its source device.
    fn unmount(&self, target: &Path) -> HalResult<()>;

    /// Source column of every entry in the active mount table, in table order.
    fn mount_sources(&self) -> HalResult<Vec<String>>;
}
