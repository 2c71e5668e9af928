use std::fs::{DirEntry, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

/// Filename suffixes used by download managers to mark an unfinished
/// write. Chrome appends `.crdownload`; Firefox uses `.part`; some
/// vendors stage through `.tmp`.
pub const IN_PROGRESS_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp"];

/// Number of bytes read when probing whether a candidate is openable.
const OPEN_PROBE_BYTES: usize = 1024;

/// Whether a path carries an in-progress marker by naming convention.
pub fn has_in_progress_marker(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        // Non-UTF-8 names cannot be matched against the suffix table;
        // treat them as unfinished rather than handing them downstream.
        return true;
    };
    IN_PROGRESS_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// A file-system artifact in the process of being written into the
/// watched directory by an external process.
#[derive(Debug, Clone)]
pub struct PendingDownload {
    pub path: PathBuf,
    /// Size observed when the entry was listed.
    pub size: u64,
    /// Creation timestamp, falling back to mtime on filesystems that do
    /// not record birth times.
    pub created: SystemTime,
}

impl PendingDownload {
    /// Build a candidate from a directory entry, or `None` if the entry
    /// is not a plausible finished download: directories, marker-named
    /// files, and zero-byte files are all discarded here.
    pub fn from_entry(entry: &DirEntry) -> Option<Self> {
        let path = entry.path();
        if has_in_progress_marker(&path) {
            trace!(target: "watch.poll", path = %path.display(), "skipping in-progress marker");
            return None;
        }

        let meta = entry.metadata().ok()?;
        if !meta.is_file() || meta.len() == 0 {
            return None;
        }

        let created = meta.created().or_else(|_| meta.modified()).ok()?;
        Some(Self {
            path,
            size: meta.len(),
            created,
        })
    }

    /// Re-read the current size from the filesystem.
    pub fn sample_size(&self) -> std::io::Result<u64> {
        std::fs::metadata(&self.path).map(|m| m.len())
    }

    /// Probe whether the file can be opened for reading. The writer may
    /// still hold the file even after the size has settled; the probe is
    /// empirical and best-effort, not a lock.
    pub fn is_openable(&self) -> bool {
        let Ok(mut file) = File::open(&self.path) else {
            return false;
        };
        let mut prefix = [0u8; OPEN_PROBE_BYTES];
        file.read(&mut prefix).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_suffixes_are_detected() {
        assert!(has_in_progress_marker(Path::new("/tmp/a.csv.crdownload")));
        assert!(has_in_progress_marker(Path::new("/tmp/a.part")));
        assert!(has_in_progress_marker(Path::new("/tmp/export.tmp")));
        assert!(!has_in_progress_marker(Path::new("/tmp/a.csv")));
        assert!(!has_in_progress_marker(Path::new("/tmp/partial-list.csv")));
    }

    #[test]
    fn zero_byte_and_marker_entries_are_not_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.csv"), b"").unwrap();
        std::fs::write(dir.path().join("busy.csv.crdownload"), b"xx").unwrap();
        std::fs::write(dir.path().join("done.csv"), b"a,b\n1,2\n").unwrap();

        let mut candidates: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| PendingDownload::from_entry(&e.unwrap()))
            .collect();
        assert_eq!(candidates.len(), 1);
        let only = candidates.pop().unwrap();
        assert_eq!(only.path.file_name().unwrap(), "done.csv");
        assert_eq!(only.size, 8);
        assert!(only.is_openable());
    }
}
