//! Content store: one file per clip, named by its blob id
//!
//! - Blobs hold the raw clip bytes with no framing
//! - Writes go through a temp file + rename so readers never see partial blobs
//! - Files are 0600, the directory is owned by `Config::ensure_dirs`
//! - Deleting a missing blob is not an error

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use super::summary::{self, BlobId};

#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob file for an id
    pub fn path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.path(id).is_file()
    }

    /// Persist a clip, returning its id.
    ///
    /// An existing blob with the same id is overwritten.
    pub fn put(&self, content: &[u8]) -> io::Result<BlobId> {
        let id = summary::blob_id(&summary::summarize(content));
        self.write_blob(&id, content)?;
        Ok(id)
    }

    fn write_blob(&self, id: &str, content: &[u8]) -> io::Result<()> {
        let final_path = self.path(id);
        let temp_path = self
            .dir
            .join(format!(".{}.tmp.{}", id, std::process::id()));

        let mut file = fs::File::create(&temp_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(content)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &final_path)
    }

    /// Remove a blob. Returns whether a file was actually removed.
    pub fn delete(&self, id: &str) -> io::Result<bool> {
        match fs::remove_file(self.path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
