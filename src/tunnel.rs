// Jackson Coxson
//! Tunnel to the device through `pymobiledevice3 lockdown start-tunnel`
//!
//! The tunnel reports the device and its RSD endpoint as plain text:
//! ```text
//! Identifier: 00008110-001A2B3C4D5E801E
//! Interface: utun4
//! RSD Address: fd35:d15d:9fe6::1
//! RSD Port: 62057
//! ```

use std::{process::Stdio, time::Duration};

use tokio::{process::Child, sync::mpsc};
use tracing::{debug, warn};

use crate::{
    SpooferError,
    lines::{self, LINE_BUFFER, Next},
    process,
    utility::Utility,
};

const IDENTIFIER_PREFIX: &str = "Identifier:";
const RSD_ADDRESS_PREFIX: &str = "RSD Address:";
const RSD_PORT_PREFIX: &str = "RSD Port:";

/// Endpoint of an established tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelInfo {
    pub udid: String,
    pub host: String,
    pub port: String,
}

/// Fields collected so far from the tunnel's output
#[derive(Debug, Default)]
struct TunnelFields {
    udid: Option<String>,
    host: Option<String>,
    port: Option<String>,
}

impl TunnelFields {
    /// Records the value of a recognised line. A repeated prefix replaces the
    /// earlier value.
    fn observe(&mut self, line: &str) {
        let (slot, value) = if let Some(v) = line.strip_prefix(IDENTIFIER_PREFIX) {
            (&mut self.udid, v)
        } else if let Some(v) = line.strip_prefix(RSD_ADDRESS_PREFIX) {
            (&mut self.host, v)
        } else if let Some(v) = line.strip_prefix(RSD_PORT_PREFIX) {
            (&mut self.port, v)
        } else {
            return;
        };

        let value = value.trim();
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }

    fn complete(&self) -> Option<TunnelInfo> {
        Some(TunnelInfo {
            udid: self.udid.clone()?,
            host: self.host.clone()?,
            port: self.port.clone()?,
        })
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.udid.is_none() {
            missing.push("identifier");
        }
        if self.host.is_none() {
            missing.push("RSD address");
        }
        if self.port.is_none() {
            missing.push("RSD port");
        }
        missing
    }
}

/// Reads tunnel output until the identifier, RSD address and RSD port are all
/// known.
///
/// Every line is passed to `echo` trimmed. Fails when `timeout` elapses or the
/// output ends first.
pub async fn read_tunnel_info(
    lines: &mut mpsc::Receiver<String>,
    timeout: Duration,
    mut echo: impl FnMut(&str),
) -> Result<TunnelInfo, SpooferError> {
    let deadline = lines::deadline_after(timeout);
    let mut fields = TunnelFields::default();

    loop {
        let line = match lines::next_line(lines, deadline).await {
            Next::Line(line) => line,
            Next::Closed => {
                warn!("Tunnel output ended before it was fully parsed");
                break;
            }
            Next::TimedOut => {
                warn!("Timed out waiting for tunnel output");
                break;
            }
        };

        let line = line.trim();
        echo(line);
        fields.observe(line);
        if let Some(info) = fields.complete() {
            return Ok(info);
        }
    }

    Err(SpooferError::TunnelIncomplete {
        missing: fields.missing(),
    })
}

/// A running `start-tunnel` process
#[derive(Debug)]
pub struct TunnelProcess {
    child: Child,
}

impl TunnelProcess {
    /// Starts the tunnel and scrapes its endpoint from stdout and stderr.
    ///
    /// On failure the tunnel process is terminated before returning. On
    /// success the remaining output keeps being read in the background.
    pub async fn launch(
        utility: &Utility,
        timeout: Duration,
        echo: impl FnMut(&str),
    ) -> Result<(Self, TunnelInfo), SpooferError> {
        let args = Utility::start_tunnel_args();
        debug!("Starting tunnel: {}", utility.display(&args));

        let mut child = utility
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SpooferError::Spawn {
                program: utility.program.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
        if let Some(stdout) = child.stdout.take() {
            lines::pump(stdout, tx.clone(), "tunnel stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            lines::pump(stderr, tx, "tunnel stderr");
        }

        let mut tunnel = Self { child };
        match read_tunnel_info(&mut rx, timeout, echo).await {
            Ok(info) => {
                tokio::spawn(drain(rx));
                Ok((tunnel, info))
            }
            Err(e) => {
                tunnel.close();
                Err(e)
            }
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Asks the tunnel to shut down
    pub fn close(&mut self) {
        process::terminate(&mut self.child);
    }
}

async fn drain(mut lines: mpsc::Receiver<String>) {
    while let Some(line) = lines.recv().await {
        debug!("tunnel: {}", line.trim_end());
    }
    debug!("Tunnel output closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn feed(lines: &[&str]) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        for line in lines {
            tx.send(format!("{line}\n")).await.unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn extracts_fields_verbatim() {
        let mut rx = feed(&[
            "Interface: utun4",
            "Protocol: TunnelProtocol.QUIC",
            "Identifier: 00008110-001A2B3C4D5E801E",
            "RSD Address: fd35:d15d:9fe6::1",
            "RSD Port: 62057",
            "Use the follow connection option:",
        ])
        .await;

        let mut echoed = Vec::new();
        let info = read_tunnel_info(&mut rx, Duration::from_secs(1), |l| {
            echoed.push(l.to_string())
        })
        .await
        .unwrap();

        assert_eq!(
            info,
            TunnelInfo {
                udid: "00008110-001A2B3C4D5E801E".into(),
                host: "fd35:d15d:9fe6::1".into(),
                port: "62057".into(),
            }
        );
        // stops at the line completing the set
        assert_eq!(echoed.len(), 5);
        assert_eq!(echoed[0], "Interface: utun4");
    }

    #[tokio::test]
    async fn any_order_is_accepted() {
        let mut rx = feed(&["RSD Port: 1", "  RSD Address: ::1  ", "Identifier:abc"]).await;
        let info = read_tunnel_info(&mut rx, Duration::from_secs(1), |_| {})
            .await
            .unwrap();
        assert_eq!(info.udid, "abc");
        assert_eq!(info.host, "::1");
        assert_eq!(info.port, "1");
    }

    #[tokio::test]
    async fn later_value_replaces_earlier() {
        let mut rx = feed(&[
            "RSD Port: 1",
            "RSD Port: 2",
            "Identifier: a",
            "RSD Address: h",
        ])
        .await;
        let info = read_tunnel_info(&mut rx, Duration::from_secs(1), |_| {})
            .await
            .unwrap();
        assert_eq!(info.port, "2");
    }

    #[tokio::test]
    async fn missing_field_times_out() {
        let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
        tx.send("Identifier: a".to_string()).await.unwrap();
        tx.send("RSD Address: h".to_string()).await.unwrap();

        let started = std::time::Instant::now();
        let err = read_tunnel_info(&mut rx, Duration::from_millis(150), |_| {})
            .await
            .unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(150));
        match err {
            SpooferError::TunnelIncomplete { missing } => assert_eq!(missing, vec!["RSD port"]),
            e => panic!("unexpected error {e:?}"),
        }
        drop(tx);
    }

    #[tokio::test]
    async fn huge_timeout_means_no_deadline() {
        let mut rx = feed(&["Identifier: a", "RSD Address: h", "RSD Port: 1"]).await;
        let info = read_tunnel_info(&mut rx, Duration::from_secs(u64::MAX), |_| {})
            .await
            .unwrap();
        assert_eq!(info.port, "1");

        let mut rx = feed(&["Identifier: a"]).await;
        assert!(
            read_tunnel_info(&mut rx, Duration::MAX, |_| {})
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn empty_value_counts_as_missing() {
        let mut rx = feed(&["Identifier:   ", "RSD Address: h", "RSD Port: 1"]).await;
        let err = read_tunnel_info(&mut rx, Duration::from_secs(1), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpooferError::TunnelIncomplete { ref missing } if missing == &["identifier"]
        ));
    }

    #[tokio::test]
    async fn prefix_must_start_the_line() {
        let mut rx = feed(&["Device Identifier: a", "RSD Address: h", "RSD Port: 1"]).await;
        assert!(
            read_tunnel_info(&mut rx, Duration::from_secs(1), |_| {})
                .await
                .is_err()
        );
    }

    #[cfg(unix)]
    fn fake_utility(script: &str) -> Utility {
        Utility {
            program: "sh".into(),
            prefix: vec!["-c".into(), script.into(), "pymobiledevice3".into()],
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_scrapes_stdout_and_stderr() {
        let utility = fake_utility(
            "[ \"$1 $2\" = 'lockdown start-tunnel' ] || exit 2
             echo 'Identifier: 0000-TEST'
             echo 'RSD Address: fd00::1' >&2
             echo 'RSD Port: 49152'
             sleep 30",
        );

        let (mut tunnel, info) = TunnelProcess::launch(&utility, Duration::from_secs(5), |_| {})
            .await
            .unwrap();
        assert_eq!(info.udid, "0000-TEST");
        assert_eq!(info.host, "fd00::1");
        assert_eq!(info.port, "49152");
        assert!(tunnel.id().is_some());

        tunnel.close();
        let status = tunnel.child.wait().await.unwrap();
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_fails_when_tunnel_exits_early() {
        let utility = fake_utility("echo 'Identifier: x'; exit 1");
        let err = TunnelProcess::launch(&utility, Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SpooferError::TunnelIncomplete { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_terminates_tunnel_that_never_completes() {
        use crate::process::test_support::{exited_within, pid_path, recorded_pid};

        let pid_file = pid_path("tunnel");
        let utility = fake_utility(&format!(
            "echo $$ > '{}'
             echo 'Identifier: x'
             exec sleep 30",
            pid_file.display()
        ));

        let err = TunnelProcess::launch(&utility, Duration::from_millis(300), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpooferError::TunnelIncomplete { ref missing } if missing == &["RSD address", "RSD port"]
        ));

        let pid = recorded_pid(&pid_file).await;
        assert!(exited_within(pid, Duration::from_secs(3)).await);
        let _ = std::fs::remove_file(&pid_file);
    }

    #[tokio::test]
    async fn launch_reports_missing_program() {
        let utility = Utility::python("/nonexistent/iosspoofer-python");
        let err = TunnelProcess::launch(&utility, Duration::from_secs(1), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SpooferError::Spawn { .. }));
    }
}
