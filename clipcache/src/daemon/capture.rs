//! Capture pipeline: classify one selection's content and record it
//!
//! Per selection, per pass:
//! 1. blank content is ignored and leaves no trace in the tracker
//! 2. content equal to the last capture is ignored
//! 3. if the previous capture was a fragment of this one, its entry is rolled back
//! 4. new content is stored, unless another selection just stored the same bytes
//! 5. the tracker always moves on to the new content
//!
//! Clipboard ownership re-assertion is a separate step run by the event loop.

use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::daemon::clipboard::Clipboard;
use crate::daemon::tracker::{SelectionTracker, TrackedEntry};
use crate::history::{summary, BlobId, HistoryCache, IndexEntry, Selection};

/// Clock trait for testable capture timestamps
pub trait Clock {
    /// Nanoseconds since the Unix epoch
    fn now_ns(&self) -> u64;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// What a capture did with the content it was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Only whitespace; nothing changed
    Blank,
    /// Same bytes as the last capture on this selection
    Unchanged,
    /// New blob and index line written
    Stored { blob_id: BlobId, rolled_back: bool },
    /// Another selection just stored these bytes; only the tracker moved
    Duplicate { rolled_back: bool },
}

impl CaptureOutcome {
    /// True if the selection's content changed this pass
    pub fn is_new_content(&self) -> bool {
        matches!(self, Self::Stored { .. } | Self::Duplicate { .. })
    }

    pub fn rolled_back(&self) -> bool {
        matches!(
            self,
            Self::Stored {
                rolled_back: true,
                ..
            } | Self::Duplicate { rolled_back: true }
        )
    }
}

/// Whether `previous` looks like a partial transfer of `current`.
///
/// Selections are sometimes read mid-transfer, so the earlier capture holds
/// only the start (or end) of what the application was copying.
pub fn is_partial_fragment(previous: &[u8], current: &[u8]) -> bool {
    !previous.is_empty() && (current.starts_with(previous) || current.ends_with(previous))
}

/// Run the capture pipeline for one selection.
///
/// I/O failures while writing are returned after the tracker has been moved
/// to the new content, so the same bytes are not retried every pass.
pub fn capture_selection(
    cache: &HistoryCache,
    tracker: &mut SelectionTracker,
    selection: &Selection,
    content: &[u8],
    now_ns: u64,
) -> io::Result<CaptureOutcome> {
    if summary::is_blank(content) {
        return Ok(CaptureOutcome::Blank);
    }

    if tracker.last_content(selection) == Some(content) {
        return Ok(CaptureOutcome::Unchanged);
    }

    let duplicate = tracker.last_content_any() == Some(content);
    let state = tracker.state_mut(selection);

    let mut rolled_back = false;
    let fragment = state
        .last_content
        .as_deref()
        .is_some_and(|prev| is_partial_fragment(prev, content));
    if fragment {
        if let Some(previous) = state.last_entry.take().filter(|e| e.written) {
            match cache.rollback_last_entry(selection, &previous.line) {
                Ok(true) => {
                    tracing::debug!(
                        %selection,
                        bytes = previous.byte_len,
                        "rolled back partial capture"
                    );
                    rolled_back = true;
                }
                Ok(false) => {
                    tracing::debug!(%selection, "previous entry no longer at log tail, not rolling back");
                }
                Err(e) => {
                    tracing::warn!(%selection, "rollback failed: {}", e);
                }
            }
        }
    }

    state.last_content = Some(content.to_vec());

    let entry = IndexEntry::new(now_ns, summary::summarize(content));
    let blob_id = entry.blob_id();

    let result = if duplicate {
        tracing::debug!(%selection, "content already stored via another selection");
        Ok(CaptureOutcome::Duplicate { rolled_back })
    } else {
        cache
            .record(selection, &entry, content)
            .map(|blob_id| CaptureOutcome::Stored {
                blob_id,
                rolled_back,
            })
    };

    let written = matches!(result, Ok(CaptureOutcome::Stored { .. }));
    state.last_blob_id = Some(blob_id);
    state.last_entry = Some(TrackedEntry::new(&entry, written));
    if result.is_ok() {
        tracker.set_last_content_any(content);
    }

    if written {
        tracing::debug!(%selection, summary = %entry.summary, "captured");
    }
    result
}

/// Whether to re-assert clipboard ownership after capturing on `selection`.
///
/// Only the clipboard selection qualifies; re-owning primary clears the
/// highlighted text in some applications.
pub fn should_reassert_ownership(
    own_clipboard: bool,
    managed: &[Selection],
    selection: &Selection,
) -> bool {
    own_clipboard && selection.is_clipboard() && managed.iter().any(Selection::is_clipboard)
}

/// Take ownership of the clipboard by writing its own content back to it.
///
/// Keeps the content servable after the owning application goes away.
pub async fn reassert_ownership<C: Clipboard>(clipboard: &C) -> io::Result<()> {
    let selection = Selection::clipboard();
    let content = clipboard.read(&selection).await;
    if content.is_empty() {
        return Ok(());
    }
    clipboard.write(&selection, &content).await
}
