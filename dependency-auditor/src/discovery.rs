//! Repository enumeration across user and organization scopes.
//!
//! A GitHub login may resolve as a user, as an organization, or as both, so
//! enumeration queries both listing endpoints and concatenates the results
//! without deduplicating the repository list itself.

use crate::pagination::collect_all;
use octocrab::models::Repository;
use octocrab::Octocrab;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

/// Errors that can occur during repository enumeration.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),
}

/// A repository owned by the audited target.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryRef {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// Full repository name in "owner/name" format.
    pub full_name: String,
}

/// Results per page for repository listings.
const REPOS_PER_PAGE: u8 = 100;

/// Enumerates every repository owned by `target`.
///
/// Queries the user-scope and organization-scope listing endpoints and
/// concatenates both result sets in page order. A scope under which the
/// target does not exist contributes an empty list.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if either listing fails for any reason other
/// than the target not existing under that scope.
pub async fn enumerate_repositories(
    octocrab: &Octocrab,
    target: &str,
) -> Result<Vec<RepositoryRef>, DiscoveryError> {
    let span = info_span!("enumerate", %target);

    async {
        let mut repositories = list_user_repositories(octocrab, target).await?;
        repositories.extend(list_org_repositories(octocrab, target).await?);

        info!(count = repositories.len(), "Enumeration complete");
        Ok(repositories)
    }
    .instrument(span)
    .await
}

/// Lists repositories under the user scope, following all pages.
async fn list_user_repositories(
    octocrab: &Octocrab,
    target: &str,
) -> Result<Vec<RepositoryRef>, DiscoveryError> {
    let first = match octocrab
        .users(target)
        .repos()
        .per_page(REPOS_PER_PAGE)
        .send()
        .await
    {
        Ok(page) => page,
        Err(error) if is_not_found(&error) => {
            debug!(%target, "Target does not resolve as a user");
            return Ok(Vec::new());
        }
        Err(error) => return Err(error.into()),
    };

    let repositories = collect_all(octocrab, first).await?;
    debug!(count = repositories.len(), "Listed user-scope repositories");
    Ok(to_repository_refs(repositories))
}

/// Lists repositories under the organization scope, following all pages.
async fn list_org_repositories(
    octocrab: &Octocrab,
    target: &str,
) -> Result<Vec<RepositoryRef>, DiscoveryError> {
    let first = match octocrab
        .orgs(target)
        .list_repos()
        .per_page(REPOS_PER_PAGE)
        .send()
        .await
    {
        Ok(page) => page,
        Err(error) if is_not_found(&error) => {
            debug!(%target, "Target does not resolve as an organization");
            return Ok(Vec::new());
        }
        Err(error) => return Err(error.into()),
    };

    let repositories = collect_all(octocrab, first).await?;
    debug!(count = repositories.len(), "Listed org-scope repositories");
    Ok(to_repository_refs(repositories))
}

/// Maps listing models onto [`RepositoryRef`], skipping entries without an
/// owner login.
fn to_repository_refs(repositories: Vec<Repository>) -> Vec<RepositoryRef> {
    repositories
        .into_iter()
        .filter_map(|repository| {
            let owner = repository.owner.as_ref()?.login.clone();
            let name = repository.name.clone();
            let full_name = repository
                .full_name
                .clone()
                .unwrap_or_else(|| format!("{}/{}", owner, name));

            Some(RepositoryRef {
                owner,
                name,
                full_name,
            })
        })
        .collect()
}

/// Returns true if the error is GitHub's not-found response.
///
/// Not-found is an expected condition in two places: a manifest missing from
/// a repository, and a target login that exists under only one of the two
/// listing scopes. Everything else is a transport or auth failure.
pub(crate) fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    // `octocrab::GitHubError` is `#[non_exhaustive]`, so build the error
    // through the public response-mapping path instead of a struct literal.
    fn github_error(status: http::StatusCode) -> octocrab::Error {
        let body = http_body_util::Full::new(bytes::Bytes::from_static(
            br#"{"message":"Not Found"}"#,
        ))
        .map_err(|never| match never {})
        .boxed();
        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        futures::executor::block_on(octocrab::map_github_error(response)).unwrap_err()
    }

    #[test]
    fn missing_resource_is_classified_as_not_found() {
        assert!(is_not_found(&github_error(http::StatusCode::NOT_FOUND)));
    }

    #[test]
    fn other_github_errors_are_not_not_found() {
        assert!(!is_not_found(&github_error(
            http::StatusCode::INTERNAL_SERVER_ERROR
        )));
        assert!(!is_not_found(&github_error(http::StatusCode::FORBIDDEN)));
    }
}
