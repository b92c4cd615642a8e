//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so we can
//! test workflows without spawning real processes.

use crate::HalResult;
use std::process::Output;
use std::time::Duration;

/// Process execution trait (external command runner).
///
/// Every method treats a non-zero exit status as [`crate::HalError::CommandFailed`] and a
/// missed deadline as [`crate::HalError::CommandTimeout`].
pub trait ProcessOps {
    /// Run a command with stdout and stderr captured.
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<Output>;

    /// Run a command with inherited stdio so its own progress output reaches the terminal.
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()>;

    /// Like [`ProcessOps::command_status`], but run with elevated privileges
    /// (`sudo`) when the backend is configured to elevate.
    fn command_status_elevated(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()>;
}
