// clipcache: clipboard history daemon library
// Shared between the capture daemon (clipcached) and the control CLI (clipctl)

// On-disk history: content store, per-selection index logs, eviction
pub mod history;

// Capture daemon: config, locking, tracker, capture pipeline, event loop
pub mod daemon;

pub mod error;
pub mod logging;

pub use error::{Error, Result};
