// Environment configuration for the daemon and clipctl
// Handles the cache directory layout, pid/status files, and capture settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::history::Selection;

/// On-disk layout tag; bump when the cache format changes incompatibly
pub const VERSION_TAG: u32 = 1;

pub const DEFAULT_MAX_CLIPS: usize = 1000;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Daemon paths and capture settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the lock, index logs, blobs, pid and status files
    pub cache_dir: PathBuf,
    /// Process exactly one pass and exit
    pub oneshot: bool,
    /// Re-assert ownership of the clipboard selection after each new clip
    pub own_clipboard: bool,
    /// Maximum entries kept per selection (0 = unlimited)
    pub max_clips: usize,
    /// Managed selections, in processing order
    pub selections: Vec<Selection>,
    /// Wake interval when no change notifier is available
    pub poll_interval: Duration,
    /// How long a pass waits for the cache lock
    pub lock_timeout: Duration,
    /// Bound on every external clipboard / window call
    pub selection_timeout: Duration,
    /// Regex over the active window title; matching passes are not recorded
    pub ignore_window: Option<String>,
}

impl Config {
    /// Default settings over an explicit cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            oneshot: false,
            own_clipboard: false,
            max_clips: DEFAULT_MAX_CLIPS,
            selections: vec![Selection::clipboard(), Selection::primary()],
            poll_interval: DEFAULT_POLL_INTERVAL,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            selection_timeout: DEFAULT_SELECTION_TIMEOUT,
            ignore_window: None,
        }
    }

    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("CLIPCACHE_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_base_dir);
        let user = lookup("USER")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(current_uid);

        let mut config =
            Self::with_cache_dir(base.join(format!("clipcache.{}.{}", VERSION_TAG, user)));

        if let Some(v) = lookup("CLIPCACHE_ONESHOT") {
            config.oneshot = parse_bool_or("CLIPCACHE_ONESHOT", &v, config.oneshot);
        }
        if let Some(v) = lookup("CLIPCACHE_OWN_CLIPBOARD") {
            config.own_clipboard = parse_bool_or("CLIPCACHE_OWN_CLIPBOARD", &v, config.own_clipboard);
        }
        if let Some(v) = lookup("CLIPCACHE_MAX_CLIPS") {
            config.max_clips = parse_or("CLIPCACHE_MAX_CLIPS", &v, config.max_clips);
        }
        if let Some(v) = lookup("CLIPCACHE_SELECTIONS") {
            let selections = parse_selections(&v);
            if selections.is_empty() {
                tracing::warn!("CLIPCACHE_SELECTIONS has no usable names, keeping defaults");
            } else {
                config.selections = selections;
            }
        }
        if let Some(v) = lookup("CLIPCACHE_POLL_MS") {
            let ms = parse_or("CLIPCACHE_POLL_MS", &v, config.poll_interval.as_millis() as u64);
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = lookup("CLIPCACHE_LOCK_TIMEOUT_MS") {
            let ms = parse_or(
                "CLIPCACHE_LOCK_TIMEOUT_MS",
                &v,
                config.lock_timeout.as_millis() as u64,
            );
            config.lock_timeout = Duration::from_millis(ms);
        }
        config.ignore_window = lookup("CLIPCACHE_IGNORE_WINDOW").filter(|s| !s.is_empty());

        config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn lock_file(&self) -> PathBuf {
        self.cache_dir.join("lock")
    }

    pub fn index_file(&self, selection: &Selection) -> PathBuf {
        self.cache_dir.join(selection.index_file_name())
    }

    pub fn pid_file(&self) -> PathBuf {
        self.cache_dir.join("daemon.pid")
    }

    pub fn status_file(&self) -> PathBuf {
        self.cache_dir.join("status")
    }

    /// True if the clipboard selection is among the managed ones
    pub fn manages_clipboard(&self) -> bool {
        self.selections.iter().any(Selection::is_clipboard)
    }

    /// Ensure the cache directory exists, owner-only
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.cache_dir, std::fs::Permissions::from_mode(0o700))?;
        }

        Ok(())
    }

    /// Write the daemon PID to the PID file
    pub fn write_pid(&self) -> std::io::Result<()> {
        self.ensure_dirs()?;
        std::fs::write(self.pid_file(), std::process::id().to_string())
    }

    /// Read the daemon PID from the PID file
    pub fn read_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.pid_file())
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Remove the PID file
    pub fn remove_pid(&self) -> std::io::Result<()> {
        match std::fs::remove_file(self.pid_file()) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Check if a process with the stored PID is still running
    #[cfg(unix)]
    pub fn is_daemon_running(&self) -> bool {
        if let Some(pid) = self.read_pid() {
            // Signal 0 only checks that the process exists
            unsafe { libc::kill(pid as i32, 0) == 0 }
        } else {
            false
        }
    }

    #[cfg(not(unix))]
    pub fn is_daemon_running(&self) -> bool {
        self.read_pid().is_some()
    }

    /// Record whether capture is enabled
    pub fn write_status(&self, enabled: bool) -> std::io::Result<()> {
        let status = if enabled { "enabled" } else { "disabled" };
        crate::history::index::atomic_write(&self.status_file(), format!("{}\n", status).as_bytes())
    }

    /// Last recorded capture status; None if never written
    pub fn read_status(&self) -> Option<bool> {
        match std::fs::read_to_string(self.status_file()).ok()?.trim() {
            "enabled" => Some(true),
            "disabled" => Some(false),
            _ => None,
        }
    }
}

/// `$XDG_RUNTIME_DIR`, else `$TMPDIR`, else `/tmp`
fn default_base_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}

fn current_uid() -> String {
    #[cfg(unix)]
    {
        unsafe { libc::getuid() }.to_string()
    }

    #[cfg(not(unix))]
    {
        "user".to_string()
    }
}

/// Parse `1/true/yes/on` and `0/false/no/off`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_bool_or(key: &str, value: &str, default: bool) -> bool {
    parse_bool(value).unwrap_or_else(|| {
        tracing::warn!("ignoring unparseable {}={:?}", key, value);
        default
    })
}

fn parse_or<T: std::str::FromStr>(key: &str, value: &str, default: T) -> T {
    value.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("ignoring unparseable {}={:?}", key, value);
        default
    })
}

/// Split a whitespace/comma separated list, dropping invalid and repeated names
pub fn parse_selections(value: &str) -> Vec<Selection> {
    let mut selections: Vec<Selection> = Vec::new();
    for name in value.split(|c: char| c == ',' || c.is_whitespace()) {
        if name.is_empty() {
            continue;
        }
        match Selection::new(name) {
            Some(s) if !selections.contains(&s) => selections.push(s),
            Some(_) => {}
            None => tracing::warn!("ignoring invalid selection name {:?}", name),
        }
    }
    selections
}
