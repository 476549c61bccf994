// Jackson Coxson
//! Confirmation of the spoof by watching the device syslog

use std::{process::Stdio, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    lines::{self, LINE_BUFFER, Next},
    process,
    utility::Utility,
};

/// Terms that show up in SpringBoard logs once a simulated location is applied
pub const KEYWORDS: [&str; 10] = [
    "simulated location",
    "simulate-location",
    "simulate location",
    "simulatelocation",
    "simulated_location",
    "corelocation",
    "locationd",
    "enabling location",
    "simulate",
    "simulated",
];

/// Result of watching the syslog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A log line mentioned the simulation
    Matched(String),
    TimedOut,
}

/// The first keyword contained in `line`, ignoring case
pub fn matching_keyword(line: &str) -> Option<&'static str> {
    let lower = line.trim().to_lowercase();
    KEYWORDS.iter().copied().find(|k| lower.contains(k))
}

/// Scans lines until one contains a keyword or `timeout` elapses.
///
/// The matched line is returned trimmed. A closed stream ends the scan early.
pub async fn scan_for_confirmation(
    lines: &mut mpsc::Receiver<String>,
    timeout: Duration,
) -> Confirmation {
    let deadline = lines::deadline_after(timeout);
    loop {
        match lines::next_line(lines, deadline).await {
            Next::Line(line) => {
                if let Some(keyword) = matching_keyword(&line) {
                    debug!("Syslog matched keyword {keyword:?}");
                    return Confirmation::Matched(line.trim().to_string());
                }
            }
            Next::Closed => {
                debug!("Syslog stream closed");
                return Confirmation::TimedOut;
            }
            Next::TimedOut => return Confirmation::TimedOut,
        }
    }
}

/// Runs `syslog live` filtered to SpringBoard and waits for a confirmation line.
///
/// The watcher is terminated afterwards. A watcher that cannot be started
/// counts as an unconfirmed spoof.
pub async fn watch_for_confirmation(utility: &Utility, timeout: Duration) -> Confirmation {
    let args = Utility::syslog_args();
    debug!("Watching syslog: {}", utility.display(&args));

    let mut child = match utility.command(&args).stdout(Stdio::piped()).spawn() {
        Ok(c) => c,
        Err(e) => {
            warn!("Unable to start syslog watcher: {e:?}");
            return Confirmation::TimedOut;
        }
    };

    let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
    if let Some(stdout) = child.stdout.take() {
        lines::pump(stdout, tx, "syslog");
    }

    let confirmation = scan_for_confirmation(&mut rx, timeout).await;
    drop(rx);
    process::terminate(&mut child);
    confirmation
}
