//! Common types and utilities shared across Leadferry crates.
//!
//! This crate holds the types every other crate needs — element
//! locators, vendor credentials — plus the observability helpers. It is
//! intentionally lightweight so that all crates can depend on it without
//! heavy transitive costs.
//!
//! # Overview
//!
//! - [`Selector`]: typed element locator, deserializable from config
//! - [`Credentials`]: vendor sign-in material with redacting `Debug`
//! - [`observability`]: centralised tracing/logging initialisation

use serde::{Deserialize, Serialize};

pub mod observability;

/// Typed element locator. Deserializes from configuration, so the vendor
/// site's markup lives in a YAML file rather than in code.
///
/// ```yaml
/// email_input: { by: id, target: user_email }
/// check_button: { by: xpath, target: "//a[@data-action='check']" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "target", rename_all = "lowercase")]
pub enum Selector {
    Css(String),
    Id(String),
    XPath(String),
}

impl Selector {
    pub fn css(target: impl Into<String>) -> Self {
        Self::Css(target.into())
    }

    pub fn id(target: impl Into<String>) -> Self {
        Self::Id(target.into())
    }

    pub fn xpath(target: impl Into<String>) -> Self {
        Self::XPath(target.into())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(target) => write!(f, "css:{target}"),
            Self::Id(target) => write!(f, "id:{target}"),
            Self::XPath(target) => write!(f, "xpath:{target}"),
        }
    }
}

/// Vendor sign-in material.
///
/// `Debug` never prints the password; credentials routinely end up in
/// tracing events and error chains.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
