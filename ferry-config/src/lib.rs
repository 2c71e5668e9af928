//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Everything that couples this system to one vendor's current markup —
//! URLs, paths, CSS/XPath selectors, wait budgets — lives in the config
//! file, never in code. Credentials are injected through `${VAR}`
//! placeholders so the YAML can be committed without secrets.

use config::{Config, ConfigError, Environment, File};
use ferry_common::{Credentials, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Top-level configuration for the Leadferry workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct FerryConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub vendor: VendorConfig,
    pub intake: IntakeConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// HTTP surface bind settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Everything needed to drive the vendor site's UI.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorConfig {
    /// e.g. `https://vendor.example.com`
    pub base_url: String,
    pub sign_in_path: String,
    /// URL fragment that identifies the sign-in page; leaving it is how
    /// we observe a successful login.
    #[serde(default = "default_sign_in_fragment")]
    pub sign_in_fragment: String,
    /// Page where the upstream network's auth token is maintained. Not
    /// every deployment updates the token on each run.
    #[serde(default)]
    pub auth_token_path: Option<String>,
    pub order_new_path: String,
    pub orders_path: String,
    /// Template for a finished order's export URL; `{order_id}` is
    /// substituted.
    pub export_path_template: String,
    pub credentials: Credentials,
    pub selectors: VendorSelectors,
    #[serde(default)]
    pub waits: WaitBudgets,
}

impl VendorConfig {
    /// Join a configured path onto the vendor base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Export URL for a created order.
    pub fn export_url(&self, order_id: &str) -> String {
        self.url(&self.export_path_template.replace("{order_id}", order_id))
    }
}

/// The vendor page elements the workflow interacts with.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorSelectors {
    pub email_input: Selector,
    pub password_input: Selector,
    #[serde(default)]
    pub token_input: Option<Selector>,
    #[serde(default)]
    pub token_submit: Option<Selector>,
    pub lead_url_input: Selector,
    pub check_button: Selector,
    #[serde(default)]
    pub leads_limit_input: Option<Selector>,
    pub create_order_button: Selector,
    /// Newest entry in the orders listing; its `id` attribute carries the
    /// order identifier.
    pub order_item: Selector,
}

/// Per-condition wait budgets, replacing the original fixed sleeps.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitBudgets {
    #[serde(default = "default_element_secs")]
    pub element_secs: u64,
    #[serde(default = "default_login_secs")]
    pub login_secs: u64,
}

impl Default for WaitBudgets {
    fn default() -> Self {
        Self {
            element_secs: default_element_secs(),
            login_secs: default_login_secs(),
        }
    }
}

/// Downstream automation form that receives the finished export.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    pub form_url: String,
    #[serde(default = "default_file_input")]
    pub file_input: Selector,
    #[serde(default = "default_submit_button")]
    pub submit_button: Selector,
    /// Remove the artifact after a successful hand-off.
    #[serde(default = "default_true")]
    pub delete_after_upload: bool,
}

/// Watched download directory and detector timings.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    #[serde(default = "default_sample_secs")]
    pub sample_secs: u64,
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            timeout_secs: default_timeout_secs(),
            settle_secs: default_settle_secs(),
            sample_secs: default_sample_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

/// WebDriver connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Cap on a single page navigation.
    #[serde(default = "default_page_load_secs")]
    pub page_load_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            page_load_secs: default_page_load_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_sign_in_fragment() -> String {
    "sign_in".into()
}
fn default_element_secs() -> u64 {
    30
}
fn default_login_secs() -> u64 {
    20
}
fn default_file_input() -> Selector {
    Selector::css("input[type='file']")
}
fn default_submit_button() -> Selector {
    Selector::css("button[type='submit']")
}
fn default_true() -> bool {
    true
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_settle_secs() -> u64 {
    3
}
fn default_sample_secs() -> u64 {
    2
}
fn default_retention_secs() -> u64 {
    3600
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_page_load_secs() -> u64 {
    60
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct FerryConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FerryConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FerryConfigLoader {
    /// Start an empty loader. File and inline sources merge in the
    /// order they are attached; `FERRY_`-prefixed environment variables
    /// (e.g. `FERRY_BROWSER__HEADLESS=false`) are merged last at
    /// [`load`](Self::load) time and win over every file.
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by
    /// suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into a
    /// typed [`FerryConfig`], expanding `${VAR}` placeholders first so
    /// secrets can stay in the environment.
    pub fn load(self) -> Result<FerryConfig, ConfigError> {
        // Environment goes in last: in the config crate, later sources
        // override earlier ones. try_parsing lets numeric and boolean
        // overrides deserialize into their typed fields.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("FERRY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FerryConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
