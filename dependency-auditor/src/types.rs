//! Core report types shared by the pipeline and the reporting tools.
//!
//! - [`DependencyRecord`] - metadata gathered for one unique dependency name
//! - [`RepositoryReport`] - a repository and its enriched dependency list
//! - [`AggregateResult`] - the output of a full aggregation run

use serde::{Deserialize, Serialize};

/// Metadata gathered for a single unique dependency name.
///
/// Created exactly once per name per run and cloned into every repository
/// report that declares the name. Absent fields are omitted from serialized
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Normalized (lower-cased) package name.
    pub name: String,

    /// Package description, if the lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Package homepage URL, if published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Package author, if published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// License identifiers, if the lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<String>>,
}

impl DependencyRecord {
    /// Creates a record with no metadata attached.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            homepage: None,
            author: None,
            licenses: None,
        }
    }

    /// Returns true if at least one of licenses or description is present.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.licenses.is_some() || self.description.is_some()
    }
}

/// One repository and its enriched dependency list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryReport {
    /// Full repository name in "owner/name" format.
    pub repo_name: String,

    /// Enriched records for every dependency the manifest declares.
    pub dependencies: Vec<DependencyRecord>,
}

/// The output of a full aggregation run.
///
/// Serializes untagged: per-repository mode emits a list of repository
/// reports, combined-unique mode emits a flat list of dependency records.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AggregateResult {
    /// One report per discovered repository.
    Repositories(Vec<RepositoryReport>),

    /// A flattened, name-deduplicated record list.
    Combined(Vec<DependencyRecord>),
}
