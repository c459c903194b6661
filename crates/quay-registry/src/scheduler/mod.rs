//! Bounded fan-out of fallible tasks

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use quay_core::error::QuayError;

use crate::RegistryResult;

/// Run `task` for every item with at most `limit` in flight, and join.
///
/// Results come back in item order regardless of completion order. The
/// first failure is returned and the remaining tasks are aborted.
pub async fn join_bounded<I, T, F, Fut, R>(items: I, limit: usize, task: F) -> RegistryResult<Vec<R>>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = RegistryResult<R>> + Send + 'static,
    R: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut count = 0;

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = task(item);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| QuayError::network("Fetch scheduler closed".to_string(), e))?;
            work.await.map(|result| (index, result))
        });
        count += 1;
    }

    let mut slots: Vec<Option<R>> = Vec::with_capacity(count);
    slots.resize_with(count, || None);

    while let Some(joined) = tasks.join_next().await {
        let (index, result) =
            joined.map_err(|e| QuayError::network("Fetch task failed".to_string(), e))??;
        slots[index] = Some(result);
    }

    Ok(slots.into_iter().flatten().collect())
}
