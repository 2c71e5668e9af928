//! The vendor workflow: sign in, place a lead-search order, acquire the
//! generated export, and hand it to the downstream intake form.
//!
//! The original deployment ran three near-duplicate scripts that differed
//! only in selectors, sleep durations, and whether a leads limit was
//! filled in. Here that is one workflow parameterised by configuration:
//! selectors and URLs come from [`ferry_config::VendorConfig`], the leads
//! limit is an `Option`, and every wait is an explicit condition with a
//! budget instead of a fixed sleep.
//!
//! All operations run against the [`ferry_driver::Browser`] capability
//! trait, so the whole choreography is testable without a real browser.

mod error;
mod export;
mod order;

pub use error::FlowError;
pub use export::{classify_processing_page, AcquireOutcome, ProcessingReason};

use std::path::PathBuf;

use ferry_config::VendorConfig;
use ferry_driver::Browser;
use serde::{Deserialize, Serialize};

/// Parameters for one lead-search order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Profile or search URL the vendor should harvest leads from.
    pub lead_source_url: String,
    /// Cap on the number of leads; some deployments leave the vendor
    /// default in place.
    #[serde(default)]
    pub leads_limit: Option<u32>,
    /// Upstream network auth token to refresh before ordering.
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Identifiers of a successfully created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub export_url: String,
}

/// A finished export on the local filesystem.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Drives one browser session through the vendor's UI.
pub struct VendorWorkflow<'a> {
    vendor: &'a VendorConfig,
    browser: &'a dyn Browser,
}

impl<'a> VendorWorkflow<'a> {
    pub fn new(vendor: &'a VendorConfig, browser: &'a dyn Browser) -> Self {
        Self { vendor, browser }
    }
}
