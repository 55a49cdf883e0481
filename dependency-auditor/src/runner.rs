//! Credentialed entry point for a full audit run.
//!
//! Builds the GitHub and registry clients from explicit configuration and
//! drives the aggregation pipeline. Clients are plain values owned by the
//! runner, so concurrent runs with different credentials never share state.

use crate::aggregate::{aggregate, AggregateError, AggregateOptions, DEFAULT_CONCURRENCY};
use crate::registry::{NpmRegistry, DEFAULT_REGISTRY_URL};
use crate::types::AggregateResult;
use octocrab::Octocrab;

/// Configuration for an audit run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// GitHub token used for API calls.
    token: String,
    /// GitHub login to enumerate.
    target: String,
    /// Flatten and deduplicate dependencies across all repositories.
    combined_unique: bool,
    /// Maximum concurrent network operations.
    concurrency: usize,
    /// Base URL of the package metadata registry.
    registry_url: String,
}

impl RunnerConfig {
    /// Creates a configuration for auditing `target` with the given token.
    pub fn new(token: String, target: String) -> Self {
        Self {
            token,
            target,
            combined_unique: false,
            concurrency: DEFAULT_CONCURRENCY,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }

    /// Enables or disables combined-unique output.
    pub fn with_combined_unique(mut self, combined_unique: bool) -> Self {
        self.combined_unique = combined_unique;
        self
    }

    /// Sets the concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets a custom registry base URL.
    pub fn with_registry_url(mut self, registry_url: String) -> Self {
        self.registry_url = registry_url;
        self
    }

    /// Returns the configured GitHub token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the login being audited.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns whether combined-unique output is enabled.
    pub fn combined_unique(&self) -> bool {
        self.combined_unique
    }

    /// Returns the concurrency cap.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the registry base URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }
}

/// Errors that can occur while running an audit.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),
    /// Pipeline errors.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Drives a full audit run with its own credentialed clients.
pub struct Runner {
    config: RunnerConfig,
    octocrab: Octocrab,
    registry: NpmRegistry,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let octocrab = Octocrab::builder()
            .personal_token(config.token().to_string())
            .build()?;
        let registry = NpmRegistry::with_base_url(config.registry_url());
        Ok(Self {
            config,
            octocrab,
            registry,
        })
    }

    /// Executes the aggregation pipeline.
    pub async fn run(&self) -> Result<AggregateResult, RunnerError> {
        let options = AggregateOptions {
            combined_unique: self.config.combined_unique(),
            concurrency: self.config.concurrency(),
        };

        Ok(aggregate(&self.octocrab, &self.registry, self.config.target(), &options).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RunnerConfig::new("token".to_string(), "socialtables".to_string());

        assert_eq!(config.target(), "socialtables");
        assert!(!config.combined_unique());
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.registry_url(), DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = RunnerConfig::new("token".to_string(), "socialtables".to_string())
            .with_combined_unique(true)
            .with_concurrency(3)
            .with_registry_url("https://registry.example.com".to_string());

        assert!(config.combined_unique());
        assert_eq!(config.concurrency(), 3);
        assert_eq!(config.registry_url(), "https://registry.example.com");
    }
}
