// Jackson Coxson
// Teardown of spawned utility processes

use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

/// Grace period between asking a process to exit and killing it
pub const STOP_GRACE: Duration = Duration::from_millis(600);

/// Whether the child has not exited yet
pub fn is_running(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

/// Asks the child to exit without waiting for it.
///
/// Unix gets SIGTERM so the utility can tear down what it set up. Elsewhere
/// the process is killed outright.
pub fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: kill(2) takes plain integers and touches no memory of ours
        if unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) } == 0 {
            return;
        }
        debug!(
            "Unable to signal {pid}: {:?}",
            std::io::Error::last_os_error()
        );
    }

    if let Err(e) = child.start_kill() {
        debug!("Unable to kill child: {e:?}");
    }
}

/// Terminates the child if it still runs, killing it when it outlives `grace`
pub async fn stop(child: &mut Child, grace: Duration) {
    if !is_running(child) {
        return;
    }
    terminate(child);
    tokio::time::sleep(grace).await;
    if is_running(child) {
        if let Err(e) = child.kill().await {
            debug!("Unable to kill child: {e:?}");
        }
    }
}
