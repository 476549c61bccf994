// Jackson Coxson
//! Developer disk image mounting through `pymobiledevice3 mounter auto-mount`

use std::process::Stdio;

use tracing::debug;

use crate::{SpooferError, utility::Utility};

/// What the mount command reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The image was mounted before this run
    AlreadyMounted,
    Completed {
        success: bool,
        stdout: String,
        stderr: String,
    },
}

/// Whether the mount command's output says the image is already mounted
pub fn is_already_mounted(stdout: &str, stderr: &str) -> bool {
    stdout.to_lowercase().contains("already mounted")
        || stderr.to_lowercase().contains("already mounted")
}

/// Runs `mounter auto-mount` to completion.
///
/// A failing mount is reported, not treated as an error. Only a command that
/// cannot be started is.
pub async fn auto_mount(utility: &Utility) -> Result<MountOutcome, SpooferError> {
    let args = Utility::auto_mount_args();
    let output = utility
        .command(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| SpooferError::Spawn {
            program: utility.program.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    debug!("auto-mount exited with {}", output.status);

    if is_already_mounted(&stdout, &stderr) {
        return Ok(MountOutcome::AlreadyMounted);
    }
    Ok(MountOutcome::Completed {
        success: output.status.success(),
        stdout,
        stderr,
    })
}
