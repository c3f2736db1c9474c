// External clipboard collaborators
// Reading/writing a selection and inspecting the focused window are done by
// external tools; every call is time-bounded and failures degrade to "nothing".

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::history::Selection;

/// Get/set the content of a selection
#[allow(async_fn_in_trait)]
pub trait Clipboard {
    /// Current content; empty on failure or timeout
    async fn read(&self, selection: &Selection) -> Vec<u8>;

    async fn write(&self, selection: &Selection, content: &[u8]) -> io::Result<()>;
}

/// Title of the focused window, used for ignore rules
#[allow(async_fn_in_trait)]
pub trait WindowInspector {
    async fn active_window_title(&self) -> Option<String>;
}

/// Clipboard access through `xsel`
#[derive(Debug, Clone)]
pub struct XselClipboard {
    timeout: Duration,
}

impl XselClipboard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(selection: &Selection, mode: &str) -> Command {
        let mut cmd = Command::new("xsel");
        cmd.args(["--logfile", "/dev/null", mode])
            .arg(format!("--{}", selection))
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Clipboard for XselClipboard {
    async fn read(&self, selection: &Selection) -> Vec<u8> {
        let mut cmd = Self::command(selection, "-o");
        cmd.stdin(Stdio::null()).stdout(Stdio::piped());

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => output.stdout,
            Ok(Ok(output)) => {
                tracing::debug!(%selection, status = %output.status, "xsel read failed");
                Vec::new()
            }
            Ok(Err(e)) => {
                tracing::debug!(%selection, "xsel read error: {}", e);
                Vec::new()
            }
            Err(_) => {
                tracing::debug!(%selection, "xsel read timed out");
                Vec::new()
            }
        }
    }

    async fn write(&self, selection: &Selection, content: &[u8]) -> io::Result<()> {
        let mut cmd = Self::command(selection, "-i");
        cmd.stdin(Stdio::piped()).stdout(Stdio::null());

        let write = async {
            let mut child = cmd.spawn()?;
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(content).await?;
                // Closing stdin lets xsel take ownership and fork
                drop(stdin);
            }
            let status = child.wait().await?;
            if status.success() {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("xsel exited with {}", status),
                ))
            }
        };

        tokio::time::timeout(self.timeout, write)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "xsel write timed out"))?
    }
}

/// Focused window title through `xdotool`
#[derive(Debug, Clone)]
pub struct XdotoolInspector {
    timeout: Duration,
}

impl XdotoolInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl WindowInspector for XdotoolInspector {
    async fn active_window_title(&self) -> Option<String> {
        let mut cmd = Command::new("xdotool");
        cmd.args(["getactivewindow", "getwindowname"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => Some(
                String::from_utf8_lossy(&output.stdout)
                    .trim_end_matches('\n')
                    .to_string(),
            ),
            _ => None,
        }
    }
}
