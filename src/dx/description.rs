//! # API description
//!
//! Discovery document served from the root of the [`spire.io API`]. It lists
//! the top-level resource URLs and the schema (media types and properties) of
//! every resource kind for each API version.
//!
//! [`spire.io API`]: https://www.spire.io/docs

use crate::core::SpireError;
use serde::Deserialize;
use std::collections::HashMap;

/// Discovery document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiDescription {
    /// Top-level resources (`sessions`, `accounts`, `billing`).
    #[serde(default)]
    pub resources: HashMap<String, ResourceLink>,

    /// Resource schemas keyed by API version and then by resource kind.
    #[serde(default)]
    pub schema: HashMap<String, HashMap<String, SchemaEntry>>,
}

/// Location of a top-level resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceLink {
    /// Absolute resource URL.
    pub url: String,
}

/// Schema of a single resource kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaEntry {
    /// Value for `Accept` / `Content-Type` headers.
    #[serde(rename = "mediaType")]
    pub media_type: String,

    /// Description of resource properties.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ApiDescription {
    /// URL of the top-level resource `name`.
    pub fn resource_url(&self, name: &str) -> Result<&str, SpireError> {
        self.resources
            .get(name)
            .map(|link| link.url.as_str())
            .ok_or_else(|| SpireError::schema(format!("no '{name}' resource in API description")))
    }

    /// Schema of the resource kind `name` for API `version`.
    pub fn schema_entry(&self, version: &str, name: &str) -> Result<&SchemaEntry, SpireError> {
        self.schema
            .get(version)
            .ok_or_else(|| SpireError::schema(format!("no schema for API version {version}")))?
            .get(name)
            .ok_or_else(|| SpireError::schema(format!("no '{name}' in schema {version}")))
    }

    /// Media type of the resource kind `name` for API `version`.
    pub fn media_type(&self, version: &str, name: &str) -> Result<&str, SpireError> {
        self.schema_entry(version, name)
            .map(|entry| entry.media_type.as_str())
    }
}
