//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod block_ops;
pub mod fake_hal;
pub mod guards;
pub mod linux_hal;
pub mod mount_ops;
pub mod process_ops;
pub mod rsync_ops;

pub use block_ops::BlockOps;
pub use fake_hal::{FakeHal, Operation};
pub use guards::MountGuard;
pub use linux_hal::LinuxHal;
pub use mount_ops::MountOps;
pub use process_ops::ProcessOps;
pub use rsync_ops::{RsyncOps, RsyncOptions};

/// Complete HAL combining all system operation traits.
pub trait SystemHal: ProcessOps + MountOps + BlockOps + RsyncOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: ProcessOps + MountOps + BlockOps + RsyncOps + Send + Sync {}
