//! The export service seam between HTTP handlers and the browser.

use async_trait::async_trait;
use ferry_common::Credentials;
use ferry_config::{FerryConfig, VendorConfig};
use ferry_driver::{Browser, BrowserSettings, WebDriverBrowser};
use ferry_flow::{AcquireOutcome, FlowError, OrderReceipt, OrderRequest, VendorWorkflow};
use ferry_watch::sweep_stale;
use tracing::{info, warn};

/// What the HTTP handlers need from the pipeline. Implemented for real
/// by [`BrowserExportService`] and by in-memory stubs in tests.
#[async_trait]
pub trait ExportService: Send + Sync {
    /// Sign in and place a lead-search order.
    async fn create_order(
        &self,
        request: OrderRequest,
        credentials: Option<Credentials>,
    ) -> Result<OrderReceipt, FlowError>;

    /// Sign in and try to pull down a finished export.
    async fn fetch_export(
        &self,
        export_url: &str,
        credentials: Option<Credentials>,
    ) -> Result<AcquireOutcome, FlowError>;
}

/// Production service: one fresh WebDriver session per request, torn
/// down when the request finishes regardless of outcome.
pub struct BrowserExportService {
    config: FerryConfig,
}

impl BrowserExportService {
    /// Build the service and sweep exports left behind by earlier runs.
    pub fn new(config: FerryConfig) -> Self {
        let retention = std::time::Duration::from_secs(config.download.retention_secs);
        match sweep_stale(&config.download.dir, retention) {
            Ok(0) => {}
            Ok(removed) => info!(target: "server", removed, "swept stale downloads at startup"),
            Err(err) => warn!(target: "server", "startup sweep failed: {err}"),
        }
        Self { config }
    }

    fn vendor_for(&self, credentials: Option<Credentials>) -> VendorConfig {
        let mut vendor = self.config.vendor.clone();
        if let Some(credentials) = credentials {
            vendor.credentials = credentials;
        }
        vendor
    }

    async fn connect(&self) -> Result<WebDriverBrowser, FlowError> {
        let settings = BrowserSettings {
            webdriver_url: self.config.browser.webdriver_url.clone(),
            headless: self.config.browser.headless,
            download_dir: Some(self.config.download.dir.clone()),
            page_load: Some(std::time::Duration::from_secs(
                self.config.browser.page_load_secs,
            )),
        };
        WebDriverBrowser::connect(&settings)
            .await
            .map_err(FlowError::Driver)
    }
}

#[async_trait]
impl ExportService for BrowserExportService {
    async fn create_order(
        &self,
        request: OrderRequest,
        credentials: Option<Credentials>,
    ) -> Result<OrderReceipt, FlowError> {
        let vendor = self.vendor_for(credentials);
        let browser = self.connect().await?;

        let result = async {
            let workflow = VendorWorkflow::new(&vendor, &browser);
            workflow.sign_in().await?;
            if let Some(token) = request.auth_token.as_deref() {
                workflow.update_auth_token(token).await?;
            }
            workflow.create_order(&request).await
        }
        .await;

        if let Err(err) = browser.close().await {
            warn!(target: "server", "browser session did not close cleanly: {err}");
        }
        result
    }

    async fn fetch_export(
        &self,
        export_url: &str,
        credentials: Option<Credentials>,
    ) -> Result<AcquireOutcome, FlowError> {
        let vendor = self.vendor_for(credentials);
        let browser = self.connect().await?;

        let result = async {
            let workflow = VendorWorkflow::new(&vendor, &browser);
            workflow.sign_in().await?;
            workflow
                .acquire_export(export_url, &self.config.download, None)
                .await
        }
        .await;

        if let Err(err) = browser.close().await {
            warn!(target: "server", "browser session did not close cleanly: {err}");
        }
        result
    }
}
