//! Staged writes and the atomic flush.
//!
//! Nothing a sync run produces touches the working tree until
//! [`StagedWrites::flush`]. Reads made during the run see staged content
//! first, then disk.
//!
//! ## Flush protocol
//!
//! 1. Normalise line endings to LF (done when staging).
//! 2. Skip files whose on-disk bytes already match.
//! 3. Write every remaining file to `<path>.codesync.tmp`.
//! 4. If any temp write fails, remove the temps written so far and stop.
//! 5. Rename each temp over its final path (atomic on POSIX).
//! 6. If a rename fails, restore the original bytes of every file already
//!    replaced, delete the ones that did not exist, and drop the remaining temps.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; disk already holds the same bytes.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf, diff: String },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path, .. } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// StagedWrites
// ---------------------------------------------------------------------------

/// In-memory overlay of every file a run intends to write.
#[derive(Debug, Default)]
pub struct StagedWrites {
    files: BTreeMap<PathBuf, String>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `content` for `path`, replacing anything staged before.
    pub fn stage(&mut self, path: impl Into<PathBuf>, content: &str) {
        let path = path.into();
        tracing::debug!("staged: {}", path.display());
        self.files.insert(path, normalize_line_endings(content));
    }

    /// Staged content if any, else the file on disk, else `None`.
    pub fn read(&self, path: &Path) -> Result<Option<String>, SyncError> {
        if let Some(content) = self.files.get(path) {
            return Ok(Some(content.clone()));
        }
        read_disk(path)
    }

    pub fn is_staged(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Unified diffs of what [`flush`](Self::flush) would change. Writes nothing.
    pub fn preview(&self, root: &Path) -> Result<Vec<WriteResult>, SyncError> {
        let mut results = Vec::new();
        for (path, content) in &self.files {
            let existing = read_disk(path)?.unwrap_or_default();
            if &existing == content {
                results.push(WriteResult::Unchanged { path: path.clone() });
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path.as_path());
            let old_header = format!("a/{}", relative.display());
            let new_header = format!("b/{}", relative.display());
            let diff = TextDiff::from_lines(&existing, content)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string();
            tracing::info!("[dry-run] would write: {}", path.display());
            results.push(WriteResult::WouldWrite {
                path: path.clone(),
                diff,
            });
        }
        Ok(results)
    }

    /// Write every staged file to disk as one batch.
    pub fn flush(self) -> Result<Vec<WriteResult>, SyncError> {
        let mut results = Vec::new();
        let mut pending: Vec<PendingWrite> = Vec::new();

        for (path, content) in &self.files {
            if read_disk(path)?.as_deref() == Some(content.as_str()) {
                tracing::debug!("unchanged: {}", path.display());
                results.push(WriteResult::Unchanged { path: path.clone() });
                continue;
            }
            let original = match read_original(path) {
                Ok(original) => original,
                Err(err) => {
                    discard(&pending);
                    return Err(err);
                }
            };
            let tmp = tmp_path(path);
            if let Err(err) = write_tmp(path, &tmp, content) {
                discard(&pending);
                return Err(err);
            }
            pending.push(PendingWrite {
                tmp,
                path: path.clone(),
                original,
            });
        }

        commit(&pending, |from, to| std::fs::rename(from, to))?;
        for write in pending {
            tracing::info!("wrote: {}", write.path.display());
            results.push(WriteResult::Written { path: write.path });
        }
        Ok(results)
    }
}

/// A temp file waiting to replace `path`.
#[derive(Debug)]
struct PendingWrite {
    tmp: PathBuf,
    path: PathBuf,
    /// Raw bytes `path` held before the flush; `None` if it did not exist.
    original: Option<Vec<u8>>,
}

fn commit(
    pending: &[PendingWrite],
    rename: impl Fn(&Path, &Path) -> std::io::Result<()>,
) -> Result<(), SyncError> {
    for (i, write) in pending.iter().enumerate() {
        if let Err(e) = rename(&write.tmp, &write.path) {
            roll_back(&pending[..i]);
            discard(&pending[i..]);
            return Err(io_err(&write.path, e));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.codesync.tmp", path.display()))
}

fn write_tmp(path: &Path, tmp: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))
}

/// Best-effort cleanup of temps that were never renamed.
fn discard(pending: &[PendingWrite]) {
    for write in pending {
        let _ = std::fs::remove_file(&write.tmp);
    }
}

/// Undo renames that already happened, newest first.
fn roll_back(done: &[PendingWrite]) {
    for write in done.iter().rev() {
        let restored = match &write.original {
            Some(bytes) => std::fs::write(&write.path, bytes),
            None => std::fs::remove_file(&write.path),
        };
        match restored {
            Ok(()) => tracing::warn!("rolled back: {}", write.path.display()),
            Err(e) => tracing::error!("could not roll back {}: {e}", write.path.display()),
        }
    }
}

fn read_original(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn read_disk(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(normalize_line_endings(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
