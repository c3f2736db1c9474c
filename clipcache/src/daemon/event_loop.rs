//! Daemon event loop
//!
//! One iteration: wait for a change signal (or the poll timer), take the
//! cache lock with a bounded wait, run the capture pipeline for every managed
//! selection in order, evict, release the lock. Single-threaded; the only
//! suspension points are the wait, the lock, and the time-bounded external
//! clipboard calls.

use std::io;

use regex::Regex;
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::daemon::capture::{
    capture_selection, reassert_ownership, should_reassert_ownership, CaptureOutcome, Clock,
    SystemClock,
};
use crate::daemon::clipboard::{Clipboard, WindowInspector};
use crate::daemon::config::Config;
use crate::daemon::lock::CacheLock;
use crate::daemon::notifier::ChangeNotifier;
use crate::daemon::tracker::SelectionTracker;
use crate::error::Result;
use crate::history::{summary, HistoryCache, Selection};

/// What one pass did
#[derive(Debug, Default)]
pub struct PassReport {
    /// Capture outcome per selection, in processing order
    pub outcomes: Vec<(Selection, CaptureOutcome)>,
    /// Index lines dropped by eviction across all selections
    pub evicted: usize,
    /// The focused window matched the ignore pattern; nothing was recorded
    pub ignored: bool,
}

impl PassReport {
    pub fn outcome(&self, selection: &Selection) -> Option<&CaptureOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == selection)
            .map(|(_, o)| o)
    }

    pub fn stored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, CaptureOutcome::Stored { .. }))
            .count()
    }
}

/// SIGUSR1 (disable), SIGUSR2 (enable) and SIGTERM streams
struct ControlSignals {
    disable: Signal,
    enable: Signal,
    terminate: Signal,
}

impl ControlSignals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            disable: signal(SignalKind::user_defined1())?,
            enable: signal(SignalKind::user_defined2())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

pub struct Daemon<C, N, W, K = SystemClock> {
    config: Config,
    cache: HistoryCache,
    tracker: SelectionTracker,
    clipboard: C,
    notifier: N,
    inspector: W,
    clock: K,
    ignore_window: Option<Regex>,
    enabled: bool,
    signals: Option<ControlSignals>,
}

impl<C, N, W, K> Daemon<C, N, W, K>
where
    C: Clipboard,
    N: ChangeNotifier,
    W: WindowInspector,
    K: Clock,
{
    pub fn new(config: Config, clipboard: C, notifier: N, inspector: W, clock: K) -> Result<Self> {
        let ignore_window = config
            .ignore_window
            .as_deref()
            .map(Regex::new)
            .transpose()?;
        let cache = HistoryCache::new(config.cache_dir(), &config.selections);

        Ok(Self {
            config,
            cache,
            tracker: SelectionTracker::new(),
            clipboard,
            notifier,
            inspector,
            clock,
            ignore_window,
            enabled: true,
            signals: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn inspector(&self) -> &W {
        &self.inspector
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start listening for control signals.
    ///
    /// Call before the pid file is written; an unhandled SIGUSR1 terminates
    /// the process. Idempotent.
    pub fn install_signals(&mut self) -> Result<()> {
        if self.signals.is_none() {
            self.signals = Some(ControlSignals::install()?);
        }
        Ok(())
    }

    /// One full pass over all selections under the cache lock.
    ///
    /// Fails only if the lock cannot be taken within the configured timeout;
    /// per-selection I/O errors are logged and the pass moves on.
    pub async fn run_pass(&mut self) -> Result<PassReport> {
        let _lock = CacheLock::acquire(&self.config.lock_file(), self.config.lock_timeout).await?;
        let mut report = PassReport::default();

        if self.focused_window_ignored().await {
            self.observe_all().await;
            report.ignored = true;
            return Ok(report);
        }

        let selections = self.config.selections.clone();
        for selection in &selections {
            let content = self.clipboard.read(selection).await;
            let now = self.clock.now_ns();

            let outcome = match capture_selection(
                &self.cache,
                &mut self.tracker,
                selection,
                &content,
                now,
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(%selection, "failed to record clip: {}", e);
                    continue;
                }
            };

            if outcome.is_new_content()
                && should_reassert_ownership(self.config.own_clipboard, &selections, selection)
            {
                if let Err(e) = reassert_ownership(&self.clipboard).await {
                    tracing::debug!("could not take clipboard ownership: {}", e);
                }
            }

            report.outcomes.push((selection.clone(), outcome));
        }

        if self.config.max_clips > 0 {
            for selection in &selections {
                match self.cache.evict(selection, self.config.max_clips) {
                    Ok(evicted) if !evicted.is_empty() => {
                        tracing::debug!(
                            %selection,
                            entries = evicted.entries_dropped,
                            blobs = evicted.blobs_deleted,
                            "evicted old clips"
                        );
                        report.evicted += evicted.entries_dropped;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(%selection, "eviction failed: {}", e),
                }
            }
        }

        Ok(report)
    }

    /// Handle one wake-up; returns None while capture is disabled
    pub async fn on_wake(&mut self) -> Result<Option<PassReport>> {
        if !self.enabled {
            tracing::debug!("capture disabled, ignoring wake");
            return Ok(None);
        }
        self.run_pass().await.map(Some)
    }

    /// Turn capture on or off.
    ///
    /// Re-enabling first records what every selection currently holds, so
    /// clips copied while disabled are never stored.
    pub async fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        if enabled {
            self.observe_all().await;
        }
        self.enabled = enabled;
        tracing::info!(
            "clipboard capture {}",
            if enabled { "enabled" } else { "disabled" }
        );
        if let Err(e) = self.config.write_status(enabled) {
            tracing::warn!("failed to write status file: {}", e);
        }
    }

    /// Run until terminated (or for exactly one pass in oneshot mode).
    ///
    /// A lock timeout is fatal in oneshot mode and skips the iteration otherwise.
    pub async fn run(&mut self) -> Result<()> {
        if self.config.oneshot {
            let report = self.run_pass().await?;
            tracing::debug!(stored = report.stored(), "oneshot pass complete");
            return Ok(());
        }

        if let Err(e) = self.config.write_status(self.enabled) {
            tracing::warn!("failed to write status file: {}", e);
        }

        let mut signals = match self.signals.take() {
            Some(signals) => signals,
            None => ControlSignals::install()?,
        };

        loop {
            tokio::select! {
                _ = self.notifier.wait() => {
                    match self.on_wake().await {
                        Ok(_) => {}
                        Err(e) if e.is_lock_timeout() => {
                            tracing::warn!("{}, skipping this pass", e);
                        }
                        Err(e) => tracing::warn!("pass failed: {}", e),
                    }
                }
                _ = signals.disable.recv() => self.set_enabled(false).await,
                _ = signals.enable.recv() => self.set_enabled(true).await,
                _ = signals.terminate.recv() => break,
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        self.signals = Some(signals);

        tracing::info!("shutting down");
        Ok(())
    }

    async fn focused_window_ignored(&self) -> bool {
        let Some(pattern) = &self.ignore_window else {
            return false;
        };
        match self.inspector.active_window_title().await {
            Some(title) if pattern.is_match(&title) => {
                tracing::debug!(window = %title, "ignoring clipboard in matching window");
                true
            }
            _ => false,
        }
    }

    /// Mark current non-blank content of every selection as seen
    async fn observe_all(&mut self) {
        for selection in &self.config.selections {
            let content = self.clipboard.read(selection).await;
            if !summary::is_blank(&content) {
                self.tracker.observe(selection, &content);
            }
        }
    }
}
