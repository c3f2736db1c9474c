// Per-selection index log
// One line per retained clip: "<capture-time-ns> <summary>\n", oldest first.
// The line order is the authoritative history order.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::summary::{self, BlobId};

/// One parsed index line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub timestamp_ns: u64,
    pub summary: String,
}

impl IndexEntry {
    pub fn new(timestamp_ns: u64, summary: String) -> Self {
        Self {
            timestamp_ns,
            summary,
        }
    }

    /// Parse a line without its trailing newline
    pub fn parse(line: &str) -> Option<Self> {
        let (timestamp, summary) = line.split_once(' ')?;
        let timestamp_ns = timestamp.parse().ok()?;
        Some(Self::new(timestamp_ns, summary.to_string()))
    }

    /// The exact line as written to the log, newline included
    pub fn to_line(&self) -> String {
        format!("{} {}\n", self.timestamp_ns, self.summary)
    }

    pub fn blob_id(&self) -> BlobId {
        summary::blob_id(&self.summary)
    }
}

/// Append-mostly log file for one selection
#[derive(Debug, Clone)]
pub struct IndexLog {
    path: PathBuf,
}

impl IndexLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, returning the number of bytes written
    pub fn append(&self, entry: &IndexEntry) -> io::Result<u64> {
        let line = entry.to_line();

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(line.len() as u64)
    }

    /// All lines in order, without newlines. A missing log reads as empty.
    ///
    /// Only `\n` ends a line; any `\r` belongs to the summary, so line text
    /// reads back exactly as appended.
    pub fn read_lines(&self) -> io::Result<Vec<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
                .split_terminator('\n')
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// All parseable entries in order; malformed lines are skipped
    pub fn read_entries(&self) -> io::Result<Vec<IndexEntry>> {
        Ok(self
            .read_lines()?
            .iter()
            .filter_map(|line| IndexEntry::parse(line))
            .collect())
    }

    pub fn len(&self) -> io::Result<usize> {
        Ok(self.read_lines()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Cut `expected_line` off the end of the log.
    ///
    /// Truncates by exactly `expected_line.len()` bytes, and only if the log's
    /// trailing bytes still equal that line. Returns whether anything was cut.
    pub fn truncate_last(&self, expected_line: &str) -> io::Result<bool> {
        let byte_len = expected_line.len() as u64;

        let mut file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let total = file.metadata()?.len();
        if byte_len == 0 || total < byte_len {
            return Ok(false);
        }

        let mut tail = vec![0u8; byte_len as usize];
        file.seek(SeekFrom::Start(total - byte_len))?;
        file.read_exact(&mut tail)?;
        if tail != expected_line.as_bytes() {
            return Ok(false);
        }

        file.set_len(total - byte_len)?;
        Ok(true)
    }

    /// Keep only the most recent `n` lines, collapsing consecutive duplicates first.
    ///
    /// The log is replaced atomically. Returns the entries that were dropped
    /// (collapsed duplicates are not reported, their twin is still live).
    pub fn compact_to_last_n(&self, n: usize) -> io::Result<Vec<IndexEntry>> {
        let mut lines = self.read_lines()?;
        lines.dedup();

        let split = lines.len().saturating_sub(n);
        let kept = lines.split_off(split);
        self.rewrite(&kept)?;

        Ok(lines
            .iter()
            .filter_map(|line| IndexEntry::parse(line))
            .collect())
    }

    /// Drop every entry for which `keep` returns false; returns the dropped entries.
    ///
    /// Malformed lines are preserved. The log is only rewritten if something changed.
    pub fn retain<F>(&self, mut keep: F) -> io::Result<Vec<IndexEntry>>
    where
        F: FnMut(&IndexEntry) -> bool,
    {
        let lines = self.read_lines()?;
        let mut kept = Vec::with_capacity(lines.len());
        let mut dropped = Vec::new();

        for line in lines {
            match IndexEntry::parse(&line) {
                Some(entry) if !keep(&entry) => dropped.push(entry),
                _ => kept.push(line),
            }
        }

        if !dropped.is_empty() {
            self.rewrite(&kept)?;
        }
        Ok(dropped)
    }

    fn rewrite(&self, lines: &[String]) -> io::Result<()> {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        atomic_write(&self.path, contents.as_bytes())
    }
}

/// Atomically replace a file using write-to-temp + rename.
///
/// A crash leaves either the old or the new complete file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid path: {}", path.display()),
        )
    })?;

    // Same directory keeps the rename on one filesystem
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown"),
        std::process::id()
    ));

    let mut file = fs::File::create(&temp_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)
}
