// Eviction of the oldest entries once a selection exceeds its maximum

use std::io;

use super::{HistoryCache, Selection};

/// What an eviction pass removed from one selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Index lines dropped from the log
    pub entries_dropped: usize,
    /// Blob files deleted
    pub blobs_deleted: usize,
}

impl EvictionReport {
    pub fn is_empty(&self) -> bool {
        self.entries_dropped == 0 && self.blobs_deleted == 0
    }
}

impl HistoryCache {
    /// Trim a selection's log to its `max` most recent entries.
    ///
    /// `max == 0` means unlimited. The log is compacted first (atomically) and
    /// the dropped entries' blobs are released afterwards, so a crash between
    /// the two steps can only leave unreferenced blobs behind, never index
    /// lines without a blob.
    pub fn evict(&self, selection: &Selection, max: usize) -> io::Result<EvictionReport> {
        if max == 0 {
            return Ok(EvictionReport::default());
        }

        let log = self.log_or_err(selection)?;
        if log.len()? <= max {
            return Ok(EvictionReport::default());
        }

        let dropped = log.compact_to_last_n(max)?;
        let blobs_deleted = self.release_blobs(dropped.iter().map(|e| e.blob_id()))?;

        Ok(EvictionReport {
            entries_dropped: dropped.len(),
            blobs_deleted,
        })
    }
}
