// Jackson Coxson
// Line pumping from child pipes into a channel

use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
    task::JoinHandle,
    time::Instant,
};
use tracing::trace;

/// Capacity of the channel a child's output is pumped into
pub(crate) const LINE_BUFFER: usize = 256;

/// Reads `reader` line by line and sends every line to `tx`.
///
/// The task ends at end of stream, on a read error, or once the receiver is
/// dropped. Invalid UTF-8 is replaced rather than treated as an error.
pub(crate) fn pump<R>(reader: R, tx: mpsc::Sender<String>, label: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    trace!("{label}: {}", line.trim_end());
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    trace!("{label} read failed: {e:?}");
                    break;
                }
            }
        }
    })
}

/// Outcome of waiting for the next pumped line
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Next {
    Line(String),
    Closed,
    TimedOut,
}

/// The instant `timeout` from now. `None` when the clock cannot represent it,
/// which is treated as no deadline at all.
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Waits for the next line, giving up at `deadline` when there is one
pub(crate) async fn next_line(lines: &mut mpsc::Receiver<String>, deadline: Option<Instant>) -> Next {
    let received = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, lines.recv()).await {
            Ok(received) => received,
            Err(_) => return Next::TimedOut,
        },
        None => lines.recv().await,
    };
    match received {
        Some(line) => Next::Line(line),
        None => Next::Closed,
    }
}
