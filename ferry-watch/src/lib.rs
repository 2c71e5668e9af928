//! Detection of finished browser downloads.
//!
//! A browser's download manager writes into its target directory
//! asynchronously: the file first appears under a temporary name, grows
//! for a while, and is only safe to hand downstream once its size has
//! settled and the writer has released it. This crate watches a single
//! flat directory and reports the one file that represents a finished,
//! readable download.
//!
//! - [`DownloadWatcher`]: the fixed-interval poll loop
//! - [`PendingDownload`]: one observed directory entry and its predicates
//! - [`sweep_stale`] / [`clear_directory`]: housekeeping for the watched
//!   directory, deliberately separate from the watcher itself
//!
//! The watcher never mutates or deletes files; it only reads metadata and
//! a bounded byte prefix to test that a candidate is openable.

mod pending;
mod sweep;
mod watcher;

pub use pending::{has_in_progress_marker, PendingDownload, IN_PROGRESS_SUFFIXES};
pub use sweep::{clear_directory, sweep_stale};
pub use watcher::{verify_artifact, DownloadWatcher, WatchSettings};

use std::path::PathBuf;
use std::time::Duration;

/// Terminal failures of a watch. Transient conditions (a candidate that
/// cannot be opened yet, a directory listing that fails mid-poll) are
/// absorbed inside the poll loop and never escape it.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// No finished download appeared before the timeout elapsed.
    /// Retryable from the caller's point of view.
    #[error("no finished download appeared within {waited:?}")]
    Timeout { waited: Duration },

    /// A download completed but has zero length; equivalent to a timeout
    /// for the caller.
    #[error("downloaded artifact is empty: {path}")]
    EmptyArtifact { path: PathBuf },

    /// The caller's cancellation token fired mid-watch.
    #[error("watch was cancelled")]
    Cancelled,

    /// The watched directory could not be created or opened at all.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
