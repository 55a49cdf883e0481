//! The dependency-aggregation pipeline.
//!
//! Orchestrates a full audit run as a sequence of barriers: enumerate
//! repositories, fetch manifests concurrently, union the declared names into
//! one deduplicated set, enrich each unique name exactly once under the
//! concurrency cap, then re-attach the enriched records to every repository
//! that declares them. Each step fully resolves before the next begins.

use crate::discovery::{enumerate_repositories, DiscoveryError, RepositoryRef};
use crate::manifest::{fetch_manifest_deps, ManifestError};
use crate::registry::{enrich_all, MetadataLookup};
use crate::types::{AggregateResult, DependencyRecord, RepositoryReport};
use futures::stream::{self, StreamExt};
use octocrab::Octocrab;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{info, info_span, Instrument};

/// Default cap on concurrent network operations.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Errors that abort an aggregation run.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Repository enumeration failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A manifest fetch failed for a reason other than not-found.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Options for an aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Flatten and deduplicate dependencies across all repositories.
    pub combined_unique: bool,

    /// Cap on concurrent manifest fetches and enrichments.
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            combined_unique: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// A repository together with the dependency names its manifest declares.
struct RepositoryManifest {
    repository: RepositoryRef,
    dependencies: BTreeSet<String>,
}

/// Runs the full aggregation pipeline for `target`.
///
/// # Errors
///
/// Returns [`AggregateError`] if enumeration fails or any manifest fetch
/// fails for a reason other than not-found. Metadata lookup failures never
/// abort the run; they surface as absent fields in the report.
pub async fn aggregate<M>(
    octocrab: &Octocrab,
    lookup: &M,
    target: &str,
    options: &AggregateOptions,
) -> Result<AggregateResult, AggregateError>
where
    M: MetadataLookup + Sync + ?Sized,
{
    let span = info_span!(
        "aggregate",
        %target,
        combined_unique = options.combined_unique
    );

    async {
        let repositories = enumerate_repositories(octocrab, target).await?;
        info!(count = repositories.len(), "Discovered repositories");

        let manifests = collect_manifests(octocrab, repositories, options.concurrency).await?;

        let names = unique_names(&manifests);
        info!(unique = names.len(), "Collected unique dependency names");

        let records = enrich_all(lookup, &names, options.concurrency).await;

        let reports = attach_records(manifests, &records);

        if options.combined_unique {
            Ok(AggregateResult::Combined(combine_unique(reports)))
        } else {
            Ok(AggregateResult::Repositories(reports))
        }
    }
    .instrument(span)
    .await
}

/// Fetches every repository's manifest concurrently under the cap.
///
/// All fetches fully resolve before this returns; the first non-not-found
/// failure fails the whole step.
async fn collect_manifests(
    octocrab: &Octocrab,
    repositories: Vec<RepositoryRef>,
    concurrency: usize,
) -> Result<Vec<RepositoryManifest>, ManifestError> {
    let results: Vec<Result<RepositoryManifest, ManifestError>> = stream::iter(repositories)
        .map(|repository| async move {
            let dependencies = fetch_manifest_deps(octocrab, &repository).await?;
            Ok(RepositoryManifest {
                repository,
                dependencies,
            })
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    results.into_iter().collect()
}

/// Unions dependency names across all repositories into one deduplicated set.
fn unique_names(manifests: &[RepositoryManifest]) -> BTreeSet<String> {
    manifests
        .iter()
        .flat_map(|manifest| manifest.dependencies.iter().cloned())
        .collect()
}

/// Replaces each repository's raw name list with enriched records.
fn attach_records(
    manifests: Vec<RepositoryManifest>,
    records: &HashMap<String, DependencyRecord>,
) -> Vec<RepositoryReport> {
    manifests
        .into_iter()
        .map(|manifest| RepositoryReport {
            repo_name: manifest.repository.full_name,
            dependencies: manifest
                .dependencies
                .iter()
                .filter_map(|name| records.get(name).cloned())
                .collect(),
        })
        .collect()
}

/// Flattens reports into one name-deduplicated record list.
///
/// First occurrence wins on duplicate names; repositories with no
/// dependencies contribute nothing.
fn combine_unique(reports: Vec<RepositoryReport>) -> Vec<DependencyRecord> {
    let mut seen = BTreeSet::new();
    let mut combined = Vec::new();

    for report in reports {
        for record in report.dependencies {
            if seen.insert(record.name.clone()) {
                combined.push(record);
            }
        }
    }

    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(full_name: &str, dependencies: &[&str]) -> RepositoryManifest {
        let (owner, name) = full_name.split_once('/').unwrap();
        RepositoryManifest {
            repository: RepositoryRef {
                owner: owner.to_string(),
                name: name.to_string(),
                full_name: full_name.to_string(),
            },
            dependencies: dependencies.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn unique_names_unions_across_repositories() {
        let manifests = vec![
            manifest("user/a", &["x", "y"]),
            manifest("user/b", &["y", "z"]),
        ];

        let names = unique_names(&manifests);

        let expected: BTreeSet<String> =
            ["x", "y", "z"].into_iter().map(String::from).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn attach_records_shares_one_record_across_repositories() {
        let manifests = vec![
            manifest("user/a", &["x", "y"]),
            manifest("user/b", &["y"]),
        ];
        let mut records = HashMap::new();
        for name in ["x", "y"] {
            records.insert(
                name.to_string(),
                DependencyRecord {
                    description: Some(format!("package {name}")),
                    ..DependencyRecord::bare(name)
                },
            );
        }

        let reports = attach_records(manifests, &records);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].repo_name, "user/a");
        assert_eq!(reports[0].dependencies.len(), 2);
        assert_eq!(reports[1].dependencies.len(), 1);
        assert_eq!(reports[1].dependencies[0].name, "y");
        assert_eq!(
            reports[1].dependencies[0].description.as_deref(),
            Some("package y")
        );
    }

    #[test]
    fn empty_repository_keeps_empty_list_in_per_repository_mode() {
        let manifests = vec![manifest("user/empty", &[])];

        let reports = attach_records(manifests, &HashMap::new());

        assert_eq!(reports.len(), 1);
        assert!(reports[0].dependencies.is_empty());
    }

    #[test]
    fn combine_unique_flattens_first_wins_and_drops_empty() {
        let reports = vec![
            RepositoryReport {
                repo_name: "user/a".to_string(),
                dependencies: vec![
                    DependencyRecord {
                        description: Some("from a".to_string()),
                        ..DependencyRecord::bare("x")
                    },
                    DependencyRecord::bare("y"),
                ],
            },
            RepositoryReport {
                repo_name: "user/empty".to_string(),
                dependencies: vec![],
            },
            RepositoryReport {
                repo_name: "user/b".to_string(),
                dependencies: vec![
                    DependencyRecord {
                        description: Some("from b".to_string()),
                        ..DependencyRecord::bare("y")
                    },
                    DependencyRecord::bare("z"),
                ],
            },
        ];

        let combined = combine_unique(reports);

        let names: Vec<&str> = combined.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        // First occurrence wins: "y" keeps no description since user/a's copy had none.
        assert!(combined[1].description.is_none());
    }
}
