//! Chrome session shaping: command-line arguments, download preferences,
//! and the post-navigation script that hides the WebDriver flag.

use std::path::Path;

use serde_json::{json, Value};

/// Script run after each navigation. Headless Chrome advertises itself
/// through `navigator.webdriver`; some vendors refuse to serve exports
/// to sessions that carry it.
pub const WEBDRIVER_EVASION: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Command-line arguments for a scripted Chrome session.
pub fn build_chrome_arguments(headless: bool) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-popup-blocking".to_string(),
        "--window-size=1920,1080".to_string(),
        "--log-level=3".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// Chrome profile preferences that route downloads into `download_dir`
/// without prompting, and keep Safe Browsing from quarantining the
/// export before the watcher can see it.
pub fn build_download_prefs(download_dir: &Path) -> Value {
    json!({
        "download.default_directory": download_dir.display().to_string(),
        "download.prompt_for_download": false,
        "download.directory_upgrade": true,
        "safebrowsing.enabled": false,
        "safebrowsing.disable_download_protection": true,
    })
}
