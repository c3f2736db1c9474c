// Advisory lock over the cache directory
// Held for one full pass over all selections; excludes a second daemon or a
// concurrent `clipctl delete` on the same cache. Released on drop.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Take the lock if it is free right now
    pub fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        let file = OpenOptions::new().create(true).write(true).open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(ref e) if is_contended(e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Wait up to `timeout` for the lock without blocking the runtime
    pub async fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if start.elapsed() >= timeout {
                return Err(Error::LockTimeout {
                    path: path.to_path_buf(),
                    timeout,
                });
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// Blocking variant for synchronous callers (clipctl)
    pub fn acquire_blocking(path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if start.elapsed() >= timeout {
                return Err(Error::LockTimeout {
                    path: path.to_path_buf(),
                    timeout,
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_is_refused_until_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lock");

        let held = CacheLock::try_acquire(&path).unwrap().expect("first lock");
        assert!(CacheLock::try_acquire(&path).unwrap().is_none());

        drop(held);
        assert!(CacheLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_blocking_acquire_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lock");
        let _held = CacheLock::try_acquire(&path).unwrap().unwrap();

        let err = CacheLock::acquire_blocking(&path, Duration::from_millis(50)).unwrap_err();
        assert!(err.is_lock_timeout());
    }

    #[tokio::test]
    async fn test_async_acquire_waits_for_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lock");
        let held = CacheLock::try_acquire(&path).unwrap().unwrap();

        let release_path = path.clone();
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(held);
            release_path
        });

        let lock = CacheLock::acquire(&path, Duration::from_secs(5)).await.unwrap();
        assert_eq!(lock.path(), path.as_path());
        releaser.join().unwrap();
    }

    #[tokio::test]
    async fn test_async_acquire_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lock");
        let _held = CacheLock::try_acquire(&path).unwrap().unwrap();

        let err = CacheLock::acquire(&path, Duration::from_millis(30)).await.unwrap_err();
        assert!(err.is_lock_timeout());
    }
}
