//! In-memory stand-ins for the daemon's external collaborators

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::Duration;

use clipcache::daemon::{
    clipboard::{Clipboard, WindowInspector},
    notifier::ChangeNotifier,
    Clock, Config, Daemon,
};
use clipcache::history::Selection;
use tempfile::TempDir;

/// Clipboard whose selections are set directly by the test
#[derive(Debug, Default)]
pub struct FakeClipboard {
    contents: RefCell<HashMap<String, Vec<u8>>>,
    writes: RefCell<Vec<(String, Vec<u8>)>>,
}

impl FakeClipboard {
    pub fn set(&self, selection: &str, content: &str) {
        self.contents
            .borrow_mut()
            .insert(selection.to_string(), content.as_bytes().to_vec());
    }

    /// Every write the daemon made, in order
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.borrow().clone()
    }
}

impl Clipboard for FakeClipboard {
    async fn read(&self, selection: &Selection) -> Vec<u8> {
        self.contents
            .borrow()
            .get(selection.as_str())
            .cloned()
            .unwrap_or_default()
    }

    async fn write(&self, selection: &Selection, content: &[u8]) -> io::Result<()> {
        self.writes
            .borrow_mut()
            .push((selection.to_string(), content.to_vec()));
        self.contents
            .borrow_mut()
            .insert(selection.to_string(), content.to_vec());
        Ok(())
    }
}

/// Notifier that never fires; tests drive passes directly
#[derive(Debug, Default)]
pub struct IdleNotifier;

impl ChangeNotifier for IdleNotifier {
    async fn wait(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Fires at once for the first `immediate` waits, then every `interval`
#[derive(Debug)]
pub struct TickNotifier {
    immediate: usize,
    interval: Duration,
}

impl TickNotifier {
    pub fn new(immediate: usize, interval: Duration) -> Self {
        Self {
            immediate,
            interval,
        }
    }
}

impl ChangeNotifier for TickNotifier {
    async fn wait(&mut self) {
        if self.immediate > 0 {
            self.immediate -= 1;
            return;
        }
        tokio::time::sleep(self.interval).await;
    }
}

#[derive(Debug, Default)]
pub struct FakeWindow {
    title: RefCell<Option<String>>,
}

impl FakeWindow {
    pub fn focus(&self, title: &str) {
        *self.title.borrow_mut() = Some(title.to_string());
    }
}

impl WindowInspector for FakeWindow {
    async fn active_window_title(&self) -> Option<String> {
        self.title.borrow().clone()
    }
}

/// Clock that ticks one nanosecond per reading
#[derive(Debug)]
pub struct StepClock {
    now: Cell<u64>,
}

impl Default for StepClock {
    fn default() -> Self {
        Self {
            now: Cell::new(1_700_000_000_000_000_000),
        }
    }
}

impl Clock for StepClock {
    fn now_ns(&self) -> u64 {
        let now = self.now.get() + 1;
        self.now.set(now);
        now
    }
}

pub type TestDaemon = Daemon<FakeClipboard, IdleNotifier, FakeWindow, StepClock>;

/// Daemon over a fresh temp cache, managing clipboard + primary by default
pub fn test_daemon<F>(configure: F) -> (TestDaemon, TempDir)
where
    F: FnOnce(&mut Config),
{
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::with_cache_dir(temp_dir.path().join("clipcache.1.test"));
    configure(&mut config);
    config.ensure_dirs().unwrap();

    let daemon = Daemon::new(
        config,
        FakeClipboard::default(),
        IdleNotifier,
        FakeWindow::default(),
        StepClock::default(),
    )
    .unwrap();
    (daemon, temp_dir)
}

/// Names of blob files in a cache directory
pub fn blob_ids(dir: &Path) -> Vec<String> {
    let mut ids: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.len() == 16 && name.chars().all(|c| c.is_ascii_hexdigit()))
        .collect();
    ids.sort();
    ids
}

/// Summaries in a selection's index log, oldest first
pub fn summaries(daemon: &TestDaemon, selection: &str) -> Vec<String> {
    let selection = Selection::new(selection).unwrap();
    daemon
        .cache()
        .log(&selection)
        .unwrap()
        .read_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.summary)
        .collect()
}
