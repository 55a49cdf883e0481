#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod aggregate;
pub mod discovery;
pub mod manifest;
pub mod pagination;
pub mod registry;
pub mod report;
pub mod runner;
pub mod types;

pub use aggregate::{aggregate, AggregateError, AggregateOptions, DEFAULT_CONCURRENCY};
pub use discovery::{enumerate_repositories, DiscoveryError, RepositoryRef};
pub use manifest::{extract_dependency_names, fetch_manifest_deps, ManifestError};
pub use pagination::{collect_all, walk_pages};
pub use registry::{
    enrich, enrich_all, LookupError, MetadataLookup, NpmRegistry, PackageDetails,
    DEFAULT_REGISTRY_URL,
};
pub use report::{filter_known, render_text};
pub use runner::{Runner, RunnerConfig, RunnerError};
pub use types::{AggregateResult, DependencyRecord, RepositoryReport};
