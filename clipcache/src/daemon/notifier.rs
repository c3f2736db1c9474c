// Clipboard change notification
// `clipnotify` blocks until a selection changes. If it is missing or fails,
// the daemon falls back to waking every poll interval.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::history::Selection;

/// Blocks until a managed selection may have changed
#[allow(async_fn_in_trait)]
pub trait ChangeNotifier {
    async fn wait(&mut self);
}

#[derive(Debug, Clone)]
pub struct ClipnotifyNotifier {
    selections: String,
    poll_interval: Duration,
    available: bool,
}

impl ClipnotifyNotifier {
    pub fn new(selections: &[Selection], poll_interval: Duration) -> Self {
        let selections = selections
            .iter()
            .map(Selection::as_str)
            .collect::<Vec<_>>()
            .join(",");

        Self {
            selections,
            poll_interval,
            available: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl ChangeNotifier for ClipnotifyNotifier {
    async fn wait(&mut self) {
        if !self.available {
            tokio::time::sleep(self.poll_interval).await;
            return;
        }

        let status = Command::new("clipnotify")
            .args(["-s", &self.selections])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::debug!(%status, "clipnotify failed, sleeping instead");
                tokio::time::sleep(self.poll_interval).await;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    "clipnotify not found, polling every {:?}",
                    self.poll_interval
                );
                self.available = false;
                tokio::time::sleep(self.poll_interval).await;
            }
            Err(e) => {
                tracing::debug!("clipnotify error: {}", e);
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}

/// Fixed-interval wake with no external tool
#[derive(Debug, Clone)]
pub struct PollNotifier {
    interval: Duration,
}

impl PollNotifier {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl ChangeNotifier for PollNotifier {
    async fn wait(&mut self) {
        tokio::time::sleep(self.interval).await;
    }
}
