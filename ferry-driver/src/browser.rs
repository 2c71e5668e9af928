use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fantoccini::Locator;
use ferry_common::Selector;

/// Map a config-level selector onto a fantoccini locator.
pub(crate) fn to_locator(selector: &Selector) -> Locator<'_> {
    match selector {
        Selector::Css(target) => Locator::Css(target),
        Selector::Id(target) => Locator::Id(target),
        Selector::XPath(target) => Locator::XPath(target),
    }
}

/// Capabilities the workflow layer needs from a browser session.
///
/// Every wait is an explicit condition with a bounded budget; there are
/// no fixed-duration sleeps standing in for readiness signals.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load `url` in the current session.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL the session is currently on.
    async fn current_url(&self) -> Result<String>;

    /// Full HTML source of the current page.
    async fn page_source(&self) -> Result<String>;

    /// Block until an element matching `selector` is present.
    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<()>;

    /// Clear the element and type `text` into it.
    async fn fill(&self, selector: &Selector, text: &str) -> Result<()>;

    /// Click the element.
    async fn click(&self, selector: &Selector) -> Result<()>;

    /// Send an Enter keypress to the element (form submission).
    async fn press_enter(&self, selector: &Selector) -> Result<()>;

    /// Point a file input at a local path.
    async fn attach_file(&self, selector: &Selector, path: &Path) -> Result<()>;

    /// Read an attribute off the first matching element.
    async fn attr(&self, selector: &Selector, name: &str) -> Result<Option<String>>;

    /// Wait until the current URL no longer contains `fragment`.
    ///
    /// Returns `true` once the URL has left the fragment, `false` if it
    /// is still there when the budget runs out. Used to observe login
    /// redirects instead of sleeping a fixed number of seconds.
    async fn wait_until_url_leaves(&self, fragment: &str, timeout: Duration) -> Result<bool>;

    /// Tear down the underlying session.
    async fn close(&self) -> Result<()>;
}
