//! Export acquisition and downstream delivery.

use std::path::Path;
use std::time::Duration;

use ferry_config::{DownloadConfig, IntakeConfig};
use ferry_watch::{clear_directory, verify_artifact, DownloadWatcher, WatchError, WatchSettings};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{Artifact, FlowError, VendorWorkflow};

/// Navigating an export URL that is not ready serves a full HTML page
/// instead of starting a download; anything shorter is not a page.
const HTML_PAGE_MIN_BYTES: usize = 1000;

/// Why an export is not available yet. All variants are soft: the caller
/// should retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingReason {
    /// The vendor rendered its generic failure page; the export job is
    /// most likely still running.
    ServerError,
    /// The export URL does not resolve yet.
    NotFound,
    /// An error page we could not classify further.
    GenericError,
    /// An ordinary page came back with no recognisable error text.
    StillGenerating,
    /// Navigation looked like a download but no file ever arrived.
    NoDownload,
}

impl ProcessingReason {
    pub fn detail(&self) -> &'static str {
        match self {
            Self::ServerError => "vendor error page - export may still be generating",
            Self::NotFound => "export not found - it may not be generated yet",
            Self::GenericError => "vendor reported an error serving the export",
            Self::StillGenerating => "export is still being generated",
            Self::NoDownload => "no download occurred - likely still processing",
        }
    }
}

/// Result of one acquisition attempt. `Processing` is the soft
/// "retry later" state the HTTP surface maps to `202 Accepted`.
#[derive(Debug, Clone)]
pub enum AcquireOutcome {
    Ready(Artifact),
    Processing { reason: ProcessingReason },
}

/// Classify the HTML a vendor serves in place of a file download.
pub fn classify_processing_page(html: &str) -> ProcessingReason {
    let html = html.to_lowercase();
    if html.contains("something went wrong") {
        ProcessingReason::ServerError
    } else if html.contains("not found") {
        ProcessingReason::NotFound
    } else if html.contains("error") {
        ProcessingReason::GenericError
    } else {
        ProcessingReason::StillGenerating
    }
}

fn watch_settings(download: &DownloadConfig) -> WatchSettings {
    WatchSettings {
        timeout: Duration::from_secs(download.timeout_secs),
        settle_interval: Duration::from_secs(download.settle_secs),
        sample_interval: Duration::from_secs(download.sample_secs),
    }
}

impl VendorWorkflow<'_> {
    /// Navigate the export URL and wait for the file to finish arriving.
    ///
    /// The download directory is cleared first so the fresh export is the
    /// only candidate the watcher can see. A vendor that is not done
    /// generating serves an HTML page instead of a file; that, and a
    /// clean navigation after which no file ever lands, both yield
    /// [`AcquireOutcome::Processing`] rather than an error.
    pub async fn acquire_export(
        &self,
        export_url: &str,
        download: &DownloadConfig,
        cancel: Option<CancellationToken>,
    ) -> Result<AcquireOutcome, FlowError> {
        if let Err(err) = clear_directory(&download.dir) {
            warn!(target: "flow.export", "could not clear download directory: {err}");
        }

        info!(target: "flow.export", %export_url, "requesting export");
        self.browser.navigate(export_url).await?;

        let landed_on = self.browser.current_url().await?;
        if landed_on.trim_end_matches('/') == export_url.trim_end_matches('/') {
            let source = self.browser.page_source().await?;
            if source.len() > HTML_PAGE_MIN_BYTES {
                let reason = classify_processing_page(&source);
                info!(
                    target: "flow.export",
                    ?reason,
                    page_bytes = source.len(),
                    "export url served a page instead of a file"
                );
                return Ok(AcquireOutcome::Processing { reason });
            }
        }

        let mut watcher = DownloadWatcher::new(&download.dir, watch_settings(download))
            .map_err(FlowError::Watch)?;
        if let Some(token) = cancel {
            watcher = watcher.with_cancellation(token);
        }

        match watcher.wait_for_artifact().await {
            Ok(path) => {
                let size = verify_artifact(&path)?;
                info!(target: "flow.export", path = %path.display(), size, "export acquired");
                Ok(AcquireOutcome::Ready(Artifact { path, size }))
            }
            Err(WatchError::Timeout { waited }) => {
                info!(
                    target: "flow.export",
                    waited_ms = waited.as_millis() as u64,
                    "no file arrived before the watch timeout"
                );
                Ok(AcquireOutcome::Processing {
                    reason: ProcessingReason::NoDownload,
                })
            }
            Err(err) => Err(FlowError::Watch(err)),
        }
    }

    /// Upload a finished artifact to the downstream intake form through
    /// its file input, then optionally delete it.
    pub async fn deliver_to_intake(
        &self,
        intake: &IntakeConfig,
        artifact: &Path,
    ) -> Result<(), FlowError> {
        info!(
            target: "flow.intake",
            path = %artifact.display(),
            form = %intake.form_url,
            "delivering export to intake form"
        );
        self.browser.navigate(&intake.form_url).await?;
        self.browser
            .wait_for(&intake.file_input, Duration::from_secs(self.vendor.waits.element_secs))
            .await?;
        self.browser.attach_file(&intake.file_input, artifact).await?;
        self.browser.click(&intake.submit_button).await?;

        if intake.delete_after_upload {
            match std::fs::remove_file(artifact) {
                Ok(()) => info!(target: "flow.intake", "artifact removed after upload"),
                Err(err) => {
                    warn!(target: "flow.intake", "could not remove uploaded artifact: {err}")
                }
            }
        }
        Ok(())
    }
}
