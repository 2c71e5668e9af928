use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use rand::rngs::OsRng;
use rand::Rng;
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::debug;
use ::webdriver::capabilities::Capabilities;
use fantoccini::wd::TimeoutConfiguration;

use crate::browser::{to_locator, Browser};
use ferry_common::Selector;
use crate::chrome::{build_chrome_arguments, build_download_prefs, WEBDRIVER_EVASION};

/// How often URL-condition waits re-poll the session.
const URL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Connection settings for a WebDriver session.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Endpoint of a running WebDriver service, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    /// When set, Chrome routes downloads into this directory without
    /// prompting.
    pub download_dir: Option<PathBuf>,
    /// Cap on how long a single navigation may take.
    pub page_load: Option<Duration>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            download_dir: None,
            page_load: Some(Duration::from_secs(60)),
        }
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client implementing the
/// [`Browser`] capability trait.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connect to a running WebDriver service with Chrome options shaped
    /// by `settings`.
    pub async fn connect(settings: &BrowserSettings) -> Result<Self> {
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert(
            "args".to_string(),
            json!(build_chrome_arguments(settings.headless)),
        );
        chrome_opts.insert("excludeSwitches".to_string(), json!(["enable-automation"]));
        if let Some(dir) = &settings.download_dir {
            chrome_opts.insert("prefs".to_string(), build_download_prefs(dir));
        }

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| {
                format!("failed to connect to WebDriver at {}", settings.webdriver_url)
            })?;

        if let Some(page_load) = settings.page_load {
            client
                .update_timeouts(TimeoutConfiguration::new(None, Some(page_load), None))
                .await
                .context("failed to set the page-load timeout")?;
        }

        Ok(Self { client })
    }

    /// Pace keystrokes the way a person would; some vendors flag
    /// instantaneous form fills.
    async fn type_paced(&self, element: &fantoccini::elements::Element, text: &str) -> Result<()> {
        for ch in text.chars() {
            element.send_keys(&ch.to_string()).await?;
            let ms = OsRng.gen_range(30..=120);
            sleep(Duration::from_millis(ms)).await;
        }
        Ok(())
    }

    async fn find(&self, selector: &Selector) -> Result<fantoccini::elements::Element> {
        self.client
            .find(to_locator(selector))
            .await
            .with_context(|| format!("element not found: {selector}"))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(target: "driver", %url, "navigate");
        self.client.goto(url).await?;
        self.client.execute(WEBDRIVER_EVASION, vec![]).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn page_source(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<()> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(to_locator(selector))
            .await
            .with_context(|| format!("timed out waiting for {selector}"))?;
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.clear().await?;
        self.type_paced(&element, text).await
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        debug!(target: "driver", %selector, "click");
        let element = self.find(selector).await?;
        element.click().await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn press_enter(&self, selector: &Selector) -> Result<()> {
        let element = self.find(selector).await?;
        let enter: char = fantoccini::key::Key::Enter.into();
        element.send_keys(&enter.to_string()).await?;
        Ok(())
    }

    async fn attach_file(&self, selector: &Selector, path: &Path) -> Result<()> {
        // WebDriver uploads by sending the local path to the file input.
        let element = self.find(selector).await?;
        element
            .send_keys(&path.display().to_string())
            .await
            .map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn attr(&self, selector: &Selector, name: &str) -> Result<Option<String>> {
        let element = self.find(selector).await?;
        element.attr(name).await.map_err(anyhow::Error::from)
    }

    async fn wait_until_url_leaves(&self, fragment: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.current_url().await?;
            if !url.contains(fragment) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!(target: "driver", %url, %fragment, "url never left fragment");
                return Ok(false);
            }
            sleep(URL_POLL_INTERVAL).await;
        }
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().close().await.map_err(anyhow::Error::from)
    }
}
