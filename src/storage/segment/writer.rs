//! Segment Writer
//!
//! Writes a complete segment to a temp file and renames it into place, so a
//! segment is either absent or whole.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::entry::Entry;

use super::{codec, segment_path, temp_path, SegmentMeta};

/// Write `entries` as segment `sequence` in `dir`
///
/// Refuses to replace an existing segment. On any error the temp file is
/// removed and no segment is added. Once the rename succeeds the segment is
/// committed, so a failed directory sync after it only logs a warning.
pub fn write_segment(
    dir: &Path,
    sequence: u64,
    entries: &[Entry],
    sync: bool,
) -> io::Result<SegmentMeta> {
    let final_path = segment_path(dir, sequence);
    if final_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("segment {} already exists", final_path.display()),
        ));
    }

    let encoded = codec::encode_segment(entries)?;

    let mut pending = PendingFile::create(temp_path(dir, sequence))?;
    pending.file.write_all(&encoded)?;
    pending.file.flush()?;
    if sync {
        pending.file.sync_all()?;
    }
    pending.commit(&final_path)?;

    if sync {
        sync_committed_dir(dir);
    }

    Ok(SegmentMeta {
        sequence,
        path: final_path,
        entry_count: entries.len() as u64,
        file_size: encoded.len() as u64,
    })
}

/// Temp file that is deleted unless committed
struct PendingFile {
    path: PathBuf,
    file: File,
    committed: bool,
}

impl PendingFile {
    fn create(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            committed: false,
        })
    }

    fn commit(&mut self, final_path: &Path) -> io::Result<()> {
        fs::rename(&self.path, final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Best-effort sync of the directory holding a committed segment
///
/// Returns whether the sync succeeded.
fn sync_committed_dir(dir: &Path) -> bool {
    match sync_dir(dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Segment committed but syncing {} failed: {}",
                dir.display(),
                e
            );
            false
        }
    }
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
