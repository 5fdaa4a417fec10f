//! Indexed parallel map: one task per item, results tagged with the item's
//! position and returned in input order once every task has finished.

// std
use std::fmt::Debug;
use std::future::Future;
// crates
use futures::stream::{FuturesUnordered, StreamExt as _};
use tokio::task::JoinError;
use tracing::warn;
// internal

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failed item fails the whole map.
    Abort,
    /// Failed items are logged and left out of the result.
    Tolerate,
}

/// Spawns `f(position, item)` for every item and waits for all of them.
/// The output is sorted by position regardless of completion order.
pub async fn map_indexed<I, T, E, F, Fut>(items: I, f: F) -> Vec<(usize, Result<T, E>)>
where
    I: IntoIterator,
    F: Fn(usize, I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    let mut workers: FuturesUnordered<_> = items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let handle = tokio::spawn(f(position, item));
            async move {
                let result = handle.await.map_err(E::from).and_then(|result| result);
                (position, result)
            }
        })
        .collect();

    let mut results = Vec::with_capacity(workers.len());
    while let Some(result) = workers.next().await {
        results.push(result);
    }
    results.sort_unstable_by_key(|(position, _)| *position);
    results
}

/// [`map_indexed`] with failures resolved by `policy`. Under
/// [`FailurePolicy::Abort`] the error of the lowest failing position is returned.
pub async fn join_indexed<I, T, E, F, Fut>(
    items: I,
    policy: FailurePolicy,
    f: F,
) -> Result<Vec<(usize, T)>, E>
where
    I: IntoIterator,
    F: Fn(usize, I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Debug + Send + 'static,
{
    let mut values = Vec::new();
    for (position, result) in map_indexed(items, f).await {
        match (result, policy) {
            (Ok(value), _) => values.push((position, value)),
            (Err(err), FailurePolicy::Abort) => return Err(err),
            (Err(err), FailurePolicy::Tolerate) => {
                warn!("Skipping item {position} due to {err:?}");
            }
        }
    }
    Ok(values)
}
