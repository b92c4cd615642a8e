//! Host abstraction layer for rpi-coreos.
//!
//! Everything that touches the outside world (spawning tools, mounting, reading the
//! mount table, listing block devices) goes through the traits in [`hal`], so the
//! provisioning pipeline can be exercised against [`FakeHal`] without root or hardware.

pub mod blockdev;
mod error;
pub mod hal;
pub mod mount_table;

pub use error::{HalError, HalResult};
pub use hal::*;

/// True when the current process already has an effective UID of 0.
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}
