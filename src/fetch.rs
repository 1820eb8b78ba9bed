//! Bounded concurrent fetcher: runs one async fetch per identifier under a
//! hard concurrency cap, isolating per-identifier failures so one bad fetch
//! never takes down its siblings.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Fetch every identifier in `ids` with at most `max_concurrent` calls in
/// flight at any instant.
///
/// Dispatch follows the insertion order of `ids` (duplicates collapse to one
/// fetch); completion order is unconstrained. The returned map holds exactly
/// the identifiers whose fetch succeeded with a value: `Ok(None)` (not
/// found) and `Err` (transient failure, logged with the identifier) are both
/// excluded without affecting the rest of the batch. The call itself only
/// fails on `max_concurrent == 0`, before anything is dispatched.
pub async fn fetch_all<K, V, F, Fut>(
    ids: impl IntoIterator<Item = K>,
    max_concurrent: usize,
    fetch_one: F,
) -> Result<HashMap<K, V>>
where
    K: Eq + Hash + Clone + Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    if max_concurrent == 0 {
        return Err(AppError::Config(
            "max_concurrent must be at least 1".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let unique: Vec<K> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

    let mut results = HashMap::with_capacity(unique.len());
    let mut fetches = stream::iter(unique.into_iter().map(|id| {
        let fut = fetch_one(id.clone());
        async move { (id, fut.await) }
    }))
    .buffer_unordered(max_concurrent);

    while let Some((id, outcome)) = fetches.next().await {
        match outcome {
            Ok(Some(value)) => {
                results.insert(id, value);
            }
            Ok(None) => debug!(id = %id, "not found; skipping"),
            Err(e) => warn!(id = %id, error = %e, "fetch failed; skipping"),
        }
    }

    Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
