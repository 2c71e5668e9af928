//! Timing-sensitive watcher scenarios, run under tokio's paused clock so
//! they are deterministic and fast. Writer tasks simulate a browser's
//! download manager staging files into the watched directory.

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use ferry_watch::{DownloadWatcher, WatchError, WatchSettings};

fn settings(timeout_s: u64, settle_s: u64, sample_s: u64) -> WatchSettings {
    WatchSettings {
        timeout: Duration::from_secs(timeout_s),
        settle_interval: Duration::from_secs(settle_s),
        sample_interval: Duration::from_secs(sample_s),
    }
}

fn write(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

#[tokio::test(start_paused = true)]
async fn empty_directory_fails_with_timeout_not_before() {
    let dir = TempDir::new().unwrap();
    let watcher = DownloadWatcher::new(dir.path(), settings(3, 1, 1)).unwrap();

    let started = Instant::now();
    let err = watcher.wait_for_artifact().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, WatchError::Timeout { .. }));
    assert!(elapsed >= Duration::from_secs(3), "failed early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "failed late: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn marker_file_is_never_returned_finished_file_is() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    // t=2.1s: an in-progress marker appears and grows; t=5.1s it is
    // replaced by the finished export. The watcher must report the
    // finished file, never the marker'd path.
    tokio::spawn({
        let root = root.clone();
        async move {
            sleep(Duration::from_millis(2100)).await;
            write(&root, "a.csv.crdownload", &[0u8; 300]);
            sleep(Duration::from_secs(1)).await;
            write(&root, "a.csv.crdownload", &[0u8; 700]);
            sleep(Duration::from_secs(2)).await;
            write(&root, "a.csv", &[0u8; 1024]);
            std::fs::remove_file(root.join("a.csv.crdownload")).unwrap();
        }
    });

    let watcher = DownloadWatcher::new(dir.path(), settings(10, 2, 1)).unwrap();
    let started = Instant::now();
    let path = watcher.wait_for_artifact().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(path.file_name().unwrap(), "a.csv");
    assert!(path.is_absolute());
    assert!(elapsed > Duration::from_secs(7), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "returned late: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn growing_file_is_detected_once_it_settles() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    write(&root, "export.csv", &[0u8; 100]);
    // Grow the file while the first settle window is open; the watcher
    // must reject that round and succeed on a later one.
    tokio::spawn({
        let root = root.clone();
        async move {
            sleep(Duration::from_millis(500)).await;
            write(&root, "export.csv", &[0u8; 200]);
        }
    });

    let watcher = DownloadWatcher::new(dir.path(), settings(10, 2, 1)).unwrap();
    let path = watcher.wait_for_artifact().await.unwrap();

    assert_eq!(path.file_name().unwrap(), "export.csv");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 200);
}

#[tokio::test(start_paused = true)]
async fn newest_of_two_stable_files_wins() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "first.csv", b"older rows\n");
    // Real-clock gap so the creation timestamps order unambiguously.
    std::thread::sleep(Duration::from_millis(50));
    write(dir.path(), "second.csv", b"newer\n");

    let watcher = DownloadWatcher::new(dir.path(), settings(10, 1, 1)).unwrap();
    let path = watcher.wait_for_artifact().await.unwrap();
    assert_eq!(path.file_name().unwrap(), "second.csv");
}

#[tokio::test(start_paused = true)]
async fn detection_is_idempotent_and_side_effect_free() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "stable.csv", b"a,b\n1,2\n");

    let watcher = DownloadWatcher::new(dir.path(), settings(10, 1, 1)).unwrap();
    let first = watcher.wait_for_artifact().await.unwrap();
    let second = watcher.wait_for_artifact().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read(&first).unwrap(), b"a,b\n1,2\n");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_token_stops_the_watch() {
    let dir = TempDir::new().unwrap();
    let token = CancellationToken::new();

    tokio::spawn({
        let token = token.clone();
        async move {
            sleep(Duration::from_secs(1)).await;
            token.cancel();
        }
    });

    let watcher = DownloadWatcher::new(dir.path(), settings(30, 1, 1))
        .unwrap()
        .with_cancellation(token);
    let started = Instant::now();
    let err = watcher.wait_for_artifact().await.unwrap_err();

    assert!(matches!(err, WatchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(30));
}
