//! Block device listing (lsblk).

use crate::blockdev::{self, BlockDevice};
use crate::HalResult;
use std::path::Path;

/// Block device listing trait.
pub trait BlockOps {
    /// Raw `lsblk -J -oLABEL,PATH` output for the given disk.
    fn lsblk_json(&self, disk: &Path) -> HalResult<String>;

    /// Every block device under `disk` (the disk itself and its partitions), flattened.
    fn block_devices(&self, disk: &Path) -> HalResult<Vec<BlockDevice>> {
        let json = self.lsblk_json(disk)?;
        blockdev::parse_lsblk_json(&json)
    }
}
