// Jackson Coxson
//! Setting and clearing the simulated location

use std::process::Stdio;

use tokio::process::Child;
use tracing::debug;

use crate::{
    SpooferError,
    process::{self, STOP_GRACE},
    utility::Utility,
};

/// Starts `simulate-location set` with its output discarded.
///
/// The returned child is never awaited, so the spoof outlives this program
/// unless [`stop`] is called.
pub fn spawn_background(
    utility: &Utility,
    host: &str,
    port: &str,
    latitude: f64,
    longitude: f64,
) -> Result<Child, SpooferError> {
    let args = Utility::simulate_set_args(host, port, latitude, longitude);
    debug!("Starting simulation: {}", utility.display(&args));
    utility
        .command(&args)
        .spawn()
        .map_err(|source| SpooferError::Spawn {
            program: utility.program.clone(),
            source,
        })
}

/// Output of `simulate-location clear`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `simulate-location clear` against the tunnel
pub async fn clear(utility: &Utility, host: &str, port: &str) -> Result<ClearOutput, SpooferError> {
    let args = Utility::simulate_clear_args(host, port);
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

    Ok(ClearOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Stops a background simulation if it still runs
pub async fn stop(child: &mut Child) {
    process::stop(child, STOP_GRACE).await;
}
