//! Clipboard history storage
//!
//! The cache directory holds one [`IndexLog`] per managed selection and one
//! blob per retained clip in the [`ContentStore`]. Index lines are the sole
//! source of truth for which entries exist; a blob is live while any index
//! line in any selection's log still refers to its id.

pub mod eviction;
pub mod index;
pub mod store;
pub mod summary;

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use eviction::EvictionReport;
pub use index::{IndexEntry, IndexLog};
pub use store::ContentStore;
pub use summary::BlobId;

/// File name prefix of every selection's index log
pub const INDEX_FILE_PREFIX: &str = "line_cache_";

/// A named clipboard channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Selection(String);

impl Selection {
    pub const CLIPBOARD: &'static str = "clipboard";
    pub const PRIMARY: &'static str = "primary";

    /// Accepts names that are safe to embed in a file name
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self(name.to_string()))
    }

    pub fn clipboard() -> Self {
        Self(Self::CLIPBOARD.to_string())
    }

    pub fn primary() -> Self {
        Self(Self::PRIMARY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_clipboard(&self) -> bool {
        self.0 == Self::CLIPBOARD
    }

    pub fn is_primary(&self) -> bool {
        self.0 == Self::PRIMARY
    }

    pub fn index_file_name(&self) -> String {
        format!("{}{}", INDEX_FILE_PREFIX, self.0)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live index entry together with the selection it was captured on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub selection: Selection,
    pub timestamp_ns: u64,
    pub summary: String,
    pub blob_id: BlobId,
}

/// Content store plus the index logs of every managed selection
#[derive(Debug, Clone)]
pub struct HistoryCache {
    dir: PathBuf,
    store: ContentStore,
    logs: Vec<(Selection, IndexLog)>,
}

impl HistoryCache {
    pub fn new(dir: &Path, selections: &[Selection]) -> Self {
        let logs = selections
            .iter()
            .map(|s| (s.clone(), IndexLog::new(dir.join(s.index_file_name()))))
            .collect();

        Self {
            dir: dir.to_path_buf(),
            store: ContentStore::new(dir),
            logs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn selections(&self) -> impl Iterator<Item = &Selection> {
        self.logs.iter().map(|(s, _)| s)
    }

    pub fn log(&self, selection: &Selection) -> Option<&IndexLog> {
        self.logs
            .iter()
            .find(|(s, _)| s == selection)
            .map(|(_, log)| log)
    }

    fn log_or_err(&self, selection: &Selection) -> io::Result<&IndexLog> {
        self.log(selection).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("selection '{}' is not managed", selection),
            )
        })
    }

    /// Store a new clip and append its index line
    pub fn record(
        &self,
        selection: &Selection,
        entry: &IndexEntry,
        content: &[u8],
    ) -> io::Result<BlobId> {
        let log = self.log_or_err(selection)?;
        let id = self.store.put(content)?;
        log.append(entry)?;
        Ok(id)
    }

    /// Undo the most recent append on a selection.
    ///
    /// `line` is the exact text that was appended. The log shrinks by its
    /// byte length only if it still ends with that line; the entry's blob is
    /// then released. Returns whether the rollback happened.
    pub fn rollback_last_entry(&self, selection: &Selection, line: &str) -> io::Result<bool> {
        let log = self.log_or_err(selection)?;
        if !log.truncate_last(line)? {
            return Ok(false);
        }

        if let Some(entry) = IndexEntry::parse(line.trim_end_matches('\n')) {
            self.release_blobs([entry.blob_id()])?;
        }
        Ok(true)
    }

    /// Ids referenced by any live index line across all selections
    pub fn live_blob_ids(&self) -> io::Result<HashSet<BlobId>> {
        let mut ids = HashSet::new();
        for (_, log) in &self.logs {
            ids.extend(log.read_entries()?.iter().map(IndexEntry::blob_id));
        }
        Ok(ids)
    }

    /// Delete blobs that no live index line refers to any more.
    ///
    /// Returns the number of blob files removed.
    pub fn release_blobs<I>(&self, ids: I) -> io::Result<usize>
    where
        I: IntoIterator<Item = BlobId>,
    {
        let live = self.live_blob_ids()?;
        let mut removed = 0;
        for id in ids {
            if live.contains(&id) {
                tracing::debug!(blob = %id, "blob still referenced, keeping");
                continue;
            }
            if self.store.delete(&id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every live entry, newest first, optionally limited to one selection
    pub fn entries(&self, only: Option<&Selection>) -> io::Result<Vec<HistoryEntry>> {
        let mut all = Vec::new();
        for (selection, log) in &self.logs {
            if only.is_some_and(|o| o != selection) {
                continue;
            }
            for entry in log.read_entries()? {
                all.push(HistoryEntry {
                    selection: selection.clone(),
                    blob_id: entry.blob_id(),
                    timestamp_ns: entry.timestamp_ns,
                    summary: entry.summary,
                });
            }
        }
        all.sort_by(|a, b| b.timestamp_ns.cmp(&a.timestamp_ns));
        Ok(all)
    }

    /// Remove every entry whose summary `matches`, then release orphaned blobs.
    ///
    /// With `dry_run` nothing is changed and the would-be removals are returned.
    pub fn delete_matching<F>(
        &self,
        only: Option<&Selection>,
        dry_run: bool,
        mut matches: F,
    ) -> io::Result<Vec<HistoryEntry>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut removed = Vec::new();
        for (selection, log) in &self.logs {
            if only.is_some_and(|o| o != selection) {
                continue;
            }
            let dropped = if dry_run {
                log.read_entries()?
                    .into_iter()
                    .filter(|e| matches(&e.summary))
                    .collect()
            } else {
                log.retain(|e| !matches(&e.summary))?
            };
            removed.extend(dropped.into_iter().map(|entry| HistoryEntry {
                selection: selection.clone(),
                blob_id: entry.blob_id(),
                timestamp_ns: entry.timestamp_ns,
                summary: entry.summary,
            }));
        }

        if !dry_run {
            self.release_blobs(removed.iter().map(|e| e.blob_id.clone()))?;
        }
        Ok(removed)
    }
}
