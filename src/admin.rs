// Jackson Coxson
//! Administrator privilege check
//!
//! Creating the tunnel interface needs elevated rights on every platform.
//! Only Windows is refused up front.

#[cfg(windows)]
use std::process::Stdio;

#[cfg(windows)]
use tokio::process::Command;
use tracing::{debug, warn};

use crate::SpooferError;

/// Checks for elevated rights before the tunnel is started.
///
/// Windows fails with [`SpooferError::NotElevated`]. Elsewhere a missing root
/// only warns, as `start-tunnel` reports its own permission error.
pub async fn require_admin() -> Result<(), SpooferError> {
    if is_elevated().await {
        return Ok(());
    }
    if cfg!(windows) {
        Err(SpooferError::NotElevated)
    } else {
        warn!("Not running as root, starting the tunnel will likely fail");
        Ok(())
    }
}

/// `fsutil dirty query` only succeeds from an elevated prompt
#[cfg(windows)]
pub async fn is_elevated() -> bool {
    let status = Command::new("cmd")
        .args(["/C", "fsutil", "dirty", "query", "%systemdrive%"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(s) => s.success(),
        Err(e) => {
            debug!("Unable to run fsutil: {e:?}");
            false
        }
    }
}

#[cfg(unix)]
pub async fn is_elevated() -> bool {
    // SAFETY: geteuid(2) has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    debug!("Effective uid {euid}");
    euid == 0
}

#[cfg(not(any(windows, unix)))]
pub async fn is_elevated() -> bool {
    true
}
