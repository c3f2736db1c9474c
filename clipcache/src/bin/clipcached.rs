// clipcached: background daemon recording clipboard history
//
// Responsibilities:
// - Wait for selection changes (clipnotify, or polling)
// - Capture each new clip into the content store and the selection's index log
// - Roll back partial captures, dedup across selections, evict beyond the maximum
// - Honour SIGUSR1/SIGUSR2 (disable/enable) from clipctl
//
// Configuration comes from CLIPCACHE_* environment variables.

use anyhow::{Context, Result};
use clipcache::{
    daemon::{
        clipboard::{XdotoolInspector, XselClipboard},
        notifier::ClipnotifyNotifier,
        Config, Daemon, SystemClock,
    },
    logging::{self, LogConfig},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init(&LogConfig::from_env());

    let config = Config::from_env();
    config
        .ensure_dirs()
        .with_context(|| format!("Failed to create cache directory {}", config.cache_dir().display()))?;

    if !config.oneshot && config.is_daemon_running() {
        tracing::error!("clipcached already running (PID: {:?})", config.read_pid());
        std::process::exit(1);
    }

    tracing::info!(
        cache_dir = %config.cache_dir().display(),
        selections = ?config.selections.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        max_clips = config.max_clips,
        oneshot = config.oneshot,
        "clipcached starting"
    );

    let clipboard = XselClipboard::new(config.selection_timeout);
    let notifier = ClipnotifyNotifier::new(&config.selections, config.poll_interval);
    let inspector = XdotoolInspector::new(config.selection_timeout);

    let mut daemon = Daemon::new(config.clone(), clipboard, notifier, inspector, SystemClock)
        .context("Invalid CLIPCACHE_IGNORE_WINDOW pattern")?;

    if !config.oneshot {
        // clipctl signals whatever the pid file names
        daemon
            .install_signals()
            .context("Failed to install signal handlers")?;
        config.write_pid().context("Failed to write PID file")?;
    }

    let result = daemon.run().await;

    if !config.oneshot {
        config.remove_pid().ok();
    }

    result.context("clipcached failed")
}
