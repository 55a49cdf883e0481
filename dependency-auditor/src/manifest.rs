//! Manifest retrieval and dependency-name extraction.
//!
//! Retrieves a repository's `package.json` from its default branch and
//! extracts the declared dependency names. A repository without a manifest is
//! a normal outcome and yields an empty set; any other retrieval or parse
//! failure propagates to the caller.

use crate::discovery::{is_not_found, RepositoryRef};
use octocrab::Octocrab;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Path of the dependency manifest within a repository.
const MANIFEST_PATH: &str = "package.json";

/// Errors that can occur while fetching or parsing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),

    /// The content payload could not be decoded.
    #[error("Unreadable manifest content in '{repo}'")]
    UnreadableContent { repo: String },

    /// The manifest is not valid JSON.
    #[error("Failed to parse manifest in '{repo}': {source}")]
    Parse {
        repo: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of `package.json` the auditor cares about.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    /// Direct runtime dependencies, keyed by package name.
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

/// Fetches the dependency names declared by a repository's manifest.
///
/// Retrieves `package.json` from the repository's default branch via the
/// contents API, decodes it from base64, and returns the lower-cased keys of
/// its `dependencies` section so that name comparisons elsewhere are
/// case-insensitive.
///
/// A missing manifest returns an empty set. A missing `dependencies` section
/// also returns an empty set.
///
/// # Errors
///
/// Returns [`ManifestError`] for any retrieval failure other than not-found,
/// and for content that cannot be decoded or parsed.
pub async fn fetch_manifest_deps(
    octocrab: &Octocrab,
    repository: &RepositoryRef,
) -> Result<BTreeSet<String>, ManifestError> {
    let content = match octocrab
        .repos(repository.owner.as_str(), repository.name.as_str())
        .get_content()
        .path(MANIFEST_PATH)
        .send()
        .await
    {
        Ok(content) => content,
        Err(error) if is_not_found(&error) => {
            debug!(repo = %repository.full_name, "No manifest in repository");
            return Ok(BTreeSet::new());
        }
        Err(error) => return Err(error.into()),
    };

    let Some(file) = content.items.into_iter().next() else {
        debug!(repo = %repository.full_name, "Empty content listing for manifest path");
        return Ok(BTreeSet::new());
    };

    let decoded = file
        .decoded_content()
        .ok_or_else(|| ManifestError::UnreadableContent {
            repo: repository.full_name.clone(),
        })?;

    let names = extract_dependency_names(&decoded, &repository.full_name)?;
    debug!(
        repo = %repository.full_name,
        count = names.len(),
        "Extracted dependency names"
    );
    Ok(names)
}

/// Extracts lower-cased dependency names from manifest JSON.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if `manifest` is not valid JSON.
pub fn extract_dependency_names(
    manifest: &str,
    repo: &str,
) -> Result<BTreeSet<String>, ManifestError> {
    let parsed: PackageManifest =
        serde_json::from_str(manifest).map_err(|source| ManifestError::Parse {
            repo: repo.to_string(),
            source,
        })?;

    Ok(parsed
        .dependencies
        .keys()
        .map(|name| name.to_lowercase())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_folds_names_to_lower_case() {
        let manifest = r#"{"name": "app", "dependencies": {"Lodash": "1.0", "ASYNC": "2.0"}}"#;

        let names = extract_dependency_names(manifest, "user/app").unwrap();

        let expected: BTreeSet<String> = ["lodash", "async"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn extract_without_dependencies_section_is_empty() {
        let manifest = r#"{"name": "app", "version": "1.0.0"}"#;

        let names = extract_dependency_names(manifest, "user/app").unwrap();

        assert!(names.is_empty());
    }

    #[test]
    fn extract_rejects_malformed_json() {
        let result = extract_dependency_names("not json", "user/app");

        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }
}
