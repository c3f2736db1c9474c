// Capture daemon for clipcache
// Shared between the daemon binary and clipctl (config, lock, control)

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod control;
pub mod event_loop;
pub mod lock;
pub mod notifier;
pub mod tracker;

// Re-export key types
pub use capture::{CaptureOutcome, Clock, SystemClock};
pub use config::Config;
pub use event_loop::{Daemon, PassReport};
pub use lock::CacheLock;
