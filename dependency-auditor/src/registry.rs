//! npm registry metadata lookups and dependency enrichment.
//!
//! The registry exposes two independently fallible lookups per package: one
//! for license identifiers and one for description details. Enrichment runs
//! both concurrently and degrades a failed lookup to absent fields rather
//! than failing the batch, so the report stays structurally complete even
//! when some metadata is missing.

use crate::types::DependencyRecord;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Public npm registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Errors that can occur during a registry lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level request failure.
    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("Registry returned {status} for package '{name}'")]
    Status {
        name: String,
        status: reqwest::StatusCode,
    },
}

/// Description details for a package, as published on the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDetails {
    /// Short package description.
    pub description: Option<String>,

    /// Homepage URL.
    pub homepage: Option<String>,

    /// Author name.
    pub author: Option<String>,
}

/// The two metadata lookup services consumed by enrichment.
///
/// Both lookups may fail independently; enrichment treats each failure as an
/// absent field, never as a batch failure.
#[async_trait]
pub trait MetadataLookup {
    /// Looks up the license identifiers published for `name`.
    async fn licenses(&self, name: &str) -> Result<Vec<String>, LookupError>;

    /// Looks up the description details published for `name`.
    async fn details(&self, name: &str) -> Result<PackageDetails, LookupError>;
}

/// npm registry client backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a client against the public npm registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_REGISTRY_URL)
    }

    /// Creates a client against a custom registry base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Fetches the latest published version document for a package.
    async fn get_latest(&self, name: &str) -> Result<PackageVersion, LookupError> {
        let url = format!("{}/{}/latest", self.base_url, name);
        debug!(%url, "Querying npm registry");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status {
                name: name.to_string(),
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataLookup for NpmRegistry {
    async fn licenses(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let version = self.get_latest(name).await?;
        Ok(version.license_names())
    }

    async fn details(&self, name: &str) -> Result<PackageDetails, LookupError> {
        let version = self.get_latest(name).await?;
        Ok(version.into_details())
    }
}

/// The subset of a registry version document the auditor reads.
#[derive(Debug, Deserialize)]
struct PackageVersion {
    description: Option<String>,
    homepage: Option<String>,
    author: Option<AuthorField>,
    license: Option<LicenseField>,
    /// Legacy pre-SPDX field used by older packages.
    licenses: Option<LicenseField>,
}

impl PackageVersion {
    /// Flattens the modern and legacy license fields into identifiers.
    fn license_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(field) = &self.license {
            field.collect_into(&mut names);
        }
        if let Some(field) = &self.licenses {
            field.collect_into(&mut names);
        }
        names
    }

    fn into_details(self) -> PackageDetails {
        PackageDetails {
            description: self.description,
            homepage: self.homepage,
            author: self.author.map(AuthorField::into_name),
        }
    }
}

/// A `license` value in any of the shapes found on the registry: an SPDX
/// string, a `{ "type": .. }` descriptor, or an array of either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LicenseField {
    Spdx(String),
    Descriptor {
        #[serde(rename = "type")]
        license_type: String,
    },
    Many(Vec<LicenseField>),
}

impl LicenseField {
    fn collect_into(&self, names: &mut Vec<String>) {
        match self {
            LicenseField::Spdx(name) => names.push(name.clone()),
            LicenseField::Descriptor { license_type } => names.push(license_type.clone()),
            LicenseField::Many(fields) => {
                for field in fields {
                    field.collect_into(names);
                }
            }
        }
    }
}

/// An `author` value: either a plain string or a `{ "name": .. }` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorField {
    Plain(String),
    Structured { name: String },
}

impl AuthorField {
    fn into_name(self) -> String {
        match self {
            AuthorField::Plain(name) => name,
            AuthorField::Structured { name } => name,
        }
    }
}

/// Enriches one dependency name with license and description metadata.
///
/// The two lookups run concurrently and have no ordering dependency on each
/// other. A failed lookup degrades to absent fields; enrichment as a whole
/// never fails.
pub async fn enrich<M>(lookup: &M, name: &str) -> DependencyRecord
where
    M: MetadataLookup + Sync + ?Sized,
{
    let (licenses, details) = tokio::join!(lookup.licenses(name), lookup.details(name));

    let licenses = match licenses {
        Ok(licenses) if !licenses.is_empty() => Some(licenses),
        Ok(_) => None,
        Err(error) => {
            warn!(package = %name, error = %error, "License lookup failed");
            None
        }
    };

    let details = match details {
        Ok(details) => details,
        Err(error) => {
            warn!(package = %name, error = %error, "Description lookup failed");
            PackageDetails::default()
        }
    };

    DependencyRecord {
        name: name.to_string(),
        description: details.description,
        homepage: details.homepage,
        author: details.author,
        licenses,
    }
}

/// Enriches every unique dependency name under a global concurrency cap.
///
/// At most `concurrency` enrichments are in flight at once; excess names wait
/// for a slot to free. Completion order is unordered. Each name is enriched
/// exactly once.
pub async fn enrich_all<M>(
    lookup: &M,
    names: &BTreeSet<String>,
    concurrency: usize,
) -> HashMap<String, DependencyRecord>
where
    M: MetadataLookup + Sync + ?Sized,
{
    info!(count = names.len(), concurrency, "Enriching dependencies");

    stream::iter(names.iter())
        .map(|name| async move { (name.clone(), enrich(lookup, name).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(value: serde_json::Value) -> PackageVersion {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn spdx_string_license() {
        let version = version(json!({"name": "lodash", "license": "MIT"}));

        assert_eq!(version.license_names(), vec!["MIT"]);
    }

    #[test]
    fn descriptor_object_license() {
        let version = version(json!({"license": {"type": "ISC", "url": "https://example.com"}}));

        assert_eq!(version.license_names(), vec!["ISC"]);
    }

    #[test]
    fn legacy_licenses_array() {
        let version = version(json!({
            "licenses": [
                {"type": "MIT"},
                "Apache-2.0"
            ]
        }));

        assert_eq!(version.license_names(), vec!["MIT", "Apache-2.0"]);
    }

    #[test]
    fn details_accept_structured_author() {
        let version = version(json!({
            "description": "a module",
            "homepage": "https://example.com",
            "author": {"name": "Jane Doe", "email": "jane@example.com"}
        }));

        let details = version.into_details();

        assert_eq!(details.description.as_deref(), Some("a module"));
        assert_eq!(details.homepage.as_deref(), Some("https://example.com"));
        assert_eq!(details.author.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let version = version(json!({"name": "bare"}));

        assert!(version.license_names().is_empty());
        let details = version.into_details();
        assert_eq!(details, PackageDetails::default());
    }
}
