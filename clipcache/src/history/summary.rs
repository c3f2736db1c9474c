// One-line summaries and the blob identifiers derived from them

use sha2::{Digest, Sha256};

/// Maximum number of characters kept from the first non-blank line
pub const SUMMARY_LIMIT: usize = 300;

/// Identifier of a blob in the content store (16 hex chars)
pub type BlobId = String;

/// True if the content has no non-whitespace character (empty included)
pub fn is_blank(content: &[u8]) -> bool {
    String::from_utf8_lossy(content)
        .chars()
        .all(char::is_whitespace)
}

/// Build the human-readable summary of a clip.
///
/// The first line containing a non-whitespace character, truncated to
/// [`SUMMARY_LIMIT`] characters, followed by ` (N lines)` when the clip spans
/// more than one line. Never contains a newline.
pub fn summarize(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);

    let first = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    let mut summary: String = first.chars().take(SUMMARY_LIMIT).collect();
    // A trailing CR would be eaten when the index line is read back
    let kept = summary.trim_end_matches('\r').len();
    summary.truncate(kept);

    let line_count = text.lines().count();
    if line_count > 1 {
        summary.push_str(&format!(" ({} lines)", line_count));
    }

    summary
}

/// Checksum of a summary, used as the blob's file name.
///
/// Keyed on the summary rather than the full content, so two clips sharing
/// the same truncated first line and line count map to the same blob.
pub fn blob_id(summary: &str) -> BlobId {
    let mut hasher = Sha256::new();
    hasher.update(summary.as_bytes());
    let hash = hasher.finalize();

    hex::encode(&hash[..8])
}
