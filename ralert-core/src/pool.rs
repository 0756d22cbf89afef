//! Bounded worker pool for per-identifier checks
//!
//! `min(max_concurrency, ids)` workers share one atomic index, so no id is
//! claimed twice. Tallies sit behind a mutex that is never held across an
//! await; progress is reported while holding it, which keeps `done`
//! monotonic. Workers never stop early on an alert. Once the cancellation
//! token fires, no new ids are claimed and in-flight checks complete.

use crate::types::{ReferenceCheckResult, StatusResult};
use futures::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run `check` over every id and aggregate the verdicts
///
/// `total_found` of the returned result is `ids.len()`; callers that count
/// differently overwrite it.
pub async fn check_all<F, Fut, P>(
    ids: &[String],
    max_concurrency: usize,
    check: F,
    on_progress: P,
    cancel: &CancellationToken,
) -> ReferenceCheckResult
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = StatusResult>,
    P: Fn(usize, usize),
{
    let total = ids.len();
    let workers = max_concurrency.max(1).min(total);

    let next = AtomicUsize::new(0);
    let tally = Mutex::new(ReferenceCheckResult {
        total_found: total,
        ..ReferenceCheckResult::default()
    });

    debug!(total = total, workers = workers, "Starting worker pool");

    let next = &next;
    let tally = &tally;
    let check = &check;
    let on_progress = &on_progress;

    let pool = (0..workers).map(|worker| async move {
        loop {
            if cancel.is_cancelled() {
                debug!(worker = worker, "Cancelled, claiming no more ids");
                break;
            }

            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(id) = ids.get(index) else {
                break;
            };

            let result = check(id.clone()).await;

            let mut guard = tally.lock().unwrap_or_else(PoisonError::into_inner);
            guard.record(id, result);
            on_progress(guard.checked, total);
        }
    });
    join_all(pool).await;

    let result = tally.lock().unwrap_or_else(PoisonError::into_inner).clone();
    result
}
