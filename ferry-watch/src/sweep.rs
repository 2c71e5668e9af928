use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

/// Delete entries older than `retention`, returning how many were
/// removed. Run at process startup so a crashed earlier run cannot leave
/// a stale export behind that a later watch would mistake for fresh.
///
/// A missing directory is not an error; there is nothing to sweep.
pub fn sweep_stale(dir: &Path, retention: Duration) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }

        let age = meta
            .created()
            .or_else(|_| meta.modified())
            .ok()
            .and_then(|t| now.duration_since(t).ok());
        let Some(age) = age else { continue };

        if age > retention {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(
                        target: "watch.sweep",
                        path = %path.display(),
                        age_secs = age.as_secs(),
                        "removed stale download"
                    );
                    removed += 1;
                }
                Err(err) => {
                    warn!(
                        target: "watch.sweep",
                        path = %path.display(),
                        "could not remove stale download: {err}"
                    );
                }
            }
        }
    }
    Ok(removed)
}

/// Remove every file in the directory, returning how many were removed.
/// Called before each acquisition so the freshly arriving export is the
/// only candidate the watcher can see.
pub fn clear_directory(dir: &Path) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => {
                warn!(
                    target: "watch.sweep",
                    path = %path.display(),
                    "could not clear leftover file: {err}"
                );
            }
        }
    }
    if removed > 0 {
        info!(target: "watch.sweep", dir = %dir.display(), removed, "cleared download directory");
    }
    Ok(removed)
}
