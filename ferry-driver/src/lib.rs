//! Driver layer for browser automation.
//!
//! The orchestration crates never talk to a WebDriver session directly;
//! they program against the [`Browser`] capability trait so workflows can
//! be exercised with a fake implementation in tests.
//!
//! - [`Browser`]: navigate / locate / wait-until / act capabilities
//! - [`Selector`]: typed element locators that deserialize from config
//! - [`WebDriverBrowser`]: fantoccini-backed implementation
//! - [`chrome`]: Chrome arguments and download preferences

pub mod browser;
pub mod chrome;
pub mod webdriver;

pub use browser::Browser;
pub use ferry_common::Selector;
pub use webdriver::{BrowserSettings, WebDriverBrowser};
