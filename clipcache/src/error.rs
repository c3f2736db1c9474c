//! Error types shared by the daemon and the control CLI

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Another process held the cache lock for the whole wait
    #[error("timed out after {timeout:?} waiting for cache lock {}", .path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
