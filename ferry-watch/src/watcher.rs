use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pending::PendingDownload;
use crate::WatchError;

/// Tuning knobs for a watch.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Overall budget before the watch fails with [`WatchError::Timeout`].
    pub timeout: Duration,
    /// Minimum time a candidate's size must stay constant to count as
    /// finished.
    pub settle_interval: Duration,
    /// How often the directory is re-listed while no candidate is stable.
    pub sample_interval: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            settle_interval: Duration::from_secs(3),
            sample_interval: Duration::from_secs(2),
        }
    }
}

/// Polls a single flat directory for a file that has finished arriving.
///
/// One watcher per directory; concurrent watches of the same directory
/// are unsupported by convention. The watcher holds no shared state, so
/// watching different directories concurrently is fine.
pub struct DownloadWatcher {
    dir: PathBuf,
    settings: WatchSettings,
    cancel: Option<CancellationToken>,
}

impl DownloadWatcher {
    /// Create a watcher over `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>, settings: WatchSettings) -> Result<Self, WatchError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            settings,
            cancel: None,
        })
    }

    /// Attach a cancellation token checked on every poll iteration, in
    /// addition to the timeout clock.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait until the directory holds a finished, readable download and
    /// return its absolute path.
    ///
    /// A file counts as finished once it carries no in-progress marker,
    /// is non-empty, keeps the same size across two samples separated by
    /// the settle interval, and can be opened for reading. Among several
    /// qualifying files the most recently created one wins. An empty
    /// directory is not an error; the watcher keeps polling until the
    /// timeout elapses.
    pub async fn wait_for_artifact(&self) -> Result<PathBuf, WatchError> {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;
        info!(
            target: "watch.poll",
            dir = %self.dir.display(),
            timeout_ms = self.settings.timeout.as_millis() as u64,
            "waiting for finished download"
        );

        loop {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    return Err(WatchError::Cancelled);
                }
            }
            if Instant::now() >= deadline {
                return Err(WatchError::Timeout {
                    waited: started.elapsed(),
                });
            }

            if let Some(candidate) = self.newest_candidate() {
                let first = candidate.size;
                debug!(
                    target: "watch.poll",
                    path = %candidate.path.display(),
                    size = first,
                    "sampling candidate"
                );
                sleep(self.settings.settle_interval).await;

                // The candidate may have grown, been renamed, or vanished
                // while we were settling; every one of those outcomes just
                // means another round of polling.
                match candidate.sample_size() {
                    Ok(second) if second == first && second > 0 => {
                        if candidate.is_openable() {
                            info!(
                                target: "watch.poll",
                                path = %candidate.path.display(),
                                size = second,
                                waited_ms = started.elapsed().as_millis() as u64,
                                "download is stable and readable"
                            );
                            return Ok(absolute(&candidate.path));
                        }
                        debug!(
                            target: "watch.poll",
                            path = %candidate.path.display(),
                            "size settled but writer still holds the file"
                        );
                    }
                    Ok(second) => {
                        debug!(
                            target: "watch.poll",
                            path = %candidate.path.display(),
                            "still being written: {first} -> {second} bytes"
                        );
                    }
                    Err(err) => {
                        debug!(
                            target: "watch.poll",
                            path = %candidate.path.display(),
                            "candidate disappeared while settling: {err}"
                        );
                    }
                }
            }

            sleep(self.settings.sample_interval).await;
        }
    }

    /// List the directory and pick the newest plausible candidate, or
    /// `None` if nothing qualifies yet. Listing failures are transient:
    /// the directory may be getting recreated under us.
    fn newest_candidate(&self) -> Option<PendingDownload> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    target: "watch.poll",
                    dir = %self.dir.display(),
                    "directory listing failed, will retry: {err}"
                );
                return None;
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| PendingDownload::from_entry(&entry))
            .max_by_key(|candidate| candidate.created)
    }
}

/// Confirm a detected artifact still exists and is non-empty before it is
/// handed downstream. Zero-length exports are treated like a timeout.
pub fn verify_artifact(path: &Path) -> Result<u64, WatchError> {
    let size = std::fs::metadata(path)?.len();
    if size == 0 {
        return Err(WatchError::EmptyArtifact {
            path: path.to_path_buf(),
        });
    }
    Ok(size)
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
