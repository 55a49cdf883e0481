//! Generic pagination over GitHub list endpoints.
//!
//! GitHub list responses arrive one page at a time with a `next` link.
//! [`walk_pages`] follows those links until none remains, concatenating the
//! items of every page in arrival order. The next-page fetch is injected so
//! the walk can be driven by [`octocrab`] in production and by scripted pages
//! in tests.

use http::Uri;
use octocrab::Page;
use std::future::Future;

/// Follows a paged listing to exhaustion.
///
/// `fetch_next` receives the `next` link of the current page and returns the
/// following page, or `None` when the listing ends early. Items are appended
/// in page order.
///
/// # Errors
///
/// A failed page fetch aborts the whole walk; no partial result is returned
/// and no fetch is retried.
pub async fn walk_pages<T, E, F, Fut>(first: Page<T>, mut fetch_next: F) -> Result<Vec<T>, E>
where
    F: FnMut(Uri) -> Fut,
    Fut: Future<Output = Result<Option<Page<T>>, E>>,
{
    let mut items = first.items;
    let mut next = first.next;

    while let Some(url) = next {
        match fetch_next(url).await? {
            Some(page) => {
                items.extend(page.items);
                next = page.next;
            }
            None => break,
        }
    }

    Ok(items)
}

/// Collects every page of an [`octocrab`] listing into one vector.
///
/// # Errors
///
/// Propagates the first page-fetch failure from the GitHub API.
pub async fn collect_all<T>(
    octocrab: &octocrab::Octocrab,
    first: Page<T>,
) -> Result<Vec<T>, octocrab::Error>
where
    T: serde::de::DeserializeOwned,
{
    walk_pages(first, |url| async move {
        octocrab.get_page(&Some(url)).await
    })
    .await
}
