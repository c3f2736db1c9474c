// In-memory capture state, owned by the event loop
// Never persisted: after a restart the current clipboard content is new again.

use std::collections::HashMap;

use crate::history::{BlobId, IndexEntry, Selection};

/// The index line produced by the most recent capture on a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    /// Exact line text, trailing newline included
    pub line: String,
    /// Byte length of `line` as it sits in the log
    pub byte_len: u64,
    /// Whether the line was actually appended to this selection's log
    /// (false on the cross-selection dedup path)
    pub written: bool,
}

impl TrackedEntry {
    pub fn new(entry: &IndexEntry, written: bool) -> Self {
        let line = entry.to_line();
        Self {
            byte_len: line.len() as u64,
            line,
            written,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Last non-blank content seen on this selection
    pub last_content: Option<Vec<u8>>,
    pub last_blob_id: Option<BlobId>,
    pub last_entry: Option<TrackedEntry>,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    states: HashMap<Selection, SelectionState>,
    /// Last content captured on any selection, for cross-selection dedup
    last_content_any: Option<Vec<u8>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, selection: &Selection) -> Option<&SelectionState> {
        self.states.get(selection)
    }

    pub fn state_mut(&mut self, selection: &Selection) -> &mut SelectionState {
        self.states.entry(selection.clone()).or_default()
    }

    pub fn last_content(&self, selection: &Selection) -> Option<&[u8]> {
        self.states
            .get(selection)
            .and_then(|s| s.last_content.as_deref())
    }

    pub fn last_content_any(&self) -> Option<&[u8]> {
        self.last_content_any.as_deref()
    }

    pub fn set_last_content_any(&mut self, content: &[u8]) {
        self.last_content_any = Some(content.to_vec());
    }

    /// Record content as seen without any entry behind it.
    ///
    /// Used for ignored windows and re-enable resyncs: the content will not
    /// be captured later, and no rollback can target it.
    pub fn observe(&mut self, selection: &Selection, content: &[u8]) {
        let state = self.state_mut(selection);
        state.last_content = Some(content.to_vec());
        state.last_blob_id = None;
        state.last_entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_entry_byte_len_counts_newline() {
        let entry = IndexEntry::new(12, "h\u{00e9}llo".into());
        let tracked = TrackedEntry::new(&entry, true);
        assert_eq!(tracked.line, "12 h\u{00e9}llo\n");
        assert_eq!(tracked.byte_len, 10);
    }

    #[test]
    fn test_observe_clears_entry() {
        let mut tracker = SelectionTracker::new();
        let clipboard = Selection::clipboard();

        let state = tracker.state_mut(&clipboard);
        state.last_entry = Some(TrackedEntry::new(&IndexEntry::new(1, "a".into()), true));
        state.last_blob_id = Some("deadbeef".into());

        tracker.observe(&clipboard, b"secret");
        let state = tracker.state(&clipboard).unwrap();
        assert_eq!(state.last_content.as_deref(), Some(&b"secret"[..]));
        assert!(state.last_entry.is_none());
        assert!(state.last_blob_id.is_none());
        assert!(tracker.last_content_any().is_none());
    }
}
