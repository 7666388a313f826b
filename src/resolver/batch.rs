use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::{StreamExt, future, stream};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::limits::*;
use crate::model::BookingRange;
use crate::observability as obs;

use super::{AvailabilityCache, ResolveError, Resolver, validate_venue_id};

/// Cloneable cancel switch for a spawned batch, usable after the handle
/// has been moved into `join`.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Running batch spawned by [`Resolver::spawn_batch`].
///
/// `cancel` stops queued venues from being launched. Lookups already in
/// flight run to completion and still land in the cache; only the batch's
/// result is withheld. Dropping the handle before `join` completes cancels
/// the batch the same way.
pub struct BatchHandle {
    cancelled: Arc<AtomicBool>,
    // `None` once joined.
    task: Option<JoinHandle<Option<Vec<bool>>>>,
}

impl BatchHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel_token(&self) -> CancelToken {
        CancelToken(self.cancelled.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the batch. `Ok(None)` means it was cancelled.
    pub async fn join(mut self) -> Result<Option<Vec<bool>>, ResolveError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(None);
        };
        let outcome = task.await;
        self.task = None;
        outcome.map_err(|e| ResolveError::TaskFailed(e.to_string()))
    }
}

impl Drop for BatchHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.cancel();
        }
    }
}

fn validate_batch(
    cache: &AvailabilityCache,
    venue_ids: &[String],
    range: &BookingRange,
    concurrency_limit: usize,
) -> Result<(), ResolveError> {
    if concurrency_limit == 0 || concurrency_limit > MAX_CONCURRENCY {
        return Err(ResolveError::InvalidConcurrency(concurrency_limit));
    }
    if venue_ids.len() > MAX_BATCH_VENUES {
        return Err(ResolveError::LimitExceeded("too many venues in batch"));
    }
    if cache.window() != *range {
        return Err(ResolveError::WindowMismatch);
    }
    venue_ids.iter().try_for_each(|id| validate_venue_id(id))
}

impl Resolver {
    /// Resolve many venues against one cache with at most `concurrency_limit`
    /// lookups in flight. Results follow input order.
    ///
    /// Every id is validated before any fetch starts. Individual source
    /// failures fail open and never abort the batch.
    pub async fn resolve_batch(
        &self,
        cache: &AvailabilityCache,
        venue_ids: &[String],
        range: &BookingRange,
        concurrency_limit: usize,
    ) -> Result<Vec<bool>, ResolveError> {
        validate_batch(cache, venue_ids, range, concurrency_limit)?;
        let total = venue_ids.len();
        let settled = self
            .drain(cache, venue_ids.to_vec(), concurrency_limit, None)
            .await;
        Ok(in_input_order(total, settled))
    }

    /// Cancellable [`Resolver::resolve_batch`] running on its own task.
    /// Validation happens before anything is spawned.
    pub fn spawn_batch(
        &self,
        cache: &AvailabilityCache,
        venue_ids: Vec<String>,
        range: &BookingRange,
        concurrency_limit: usize,
    ) -> Result<BatchHandle, ResolveError> {
        validate_batch(cache, &venue_ids, range, concurrency_limit)?;
        let cancelled = Arc::new(AtomicBool::new(false));
        let resolver = self.clone();
        let cache = cache.clone();
        let flag = cancelled.clone();
        let task = tokio::spawn(async move {
            let total = venue_ids.len();
            let settled = resolver
                .drain(&cache, venue_ids, concurrency_limit, Some(flag.as_ref()))
                .await;
            // The flag never resets, so any skipped venue is caught here.
            if flag.load(Ordering::Acquire) {
                metrics::counter!(obs::BATCHES_CANCELLED_TOTAL).increment(1);
                debug!(venues = total, settled = settled.len(), "availability batch cancelled");
                return None;
            }
            Some(in_input_order(total, settled))
        });
        Ok(BatchHandle {
            cancelled,
            task: Some(task),
        })
    }

    /// Work queue drained through `buffer_unordered`: a new venue is pulled
    /// only when one of the `limit` slots frees up, and not at all once
    /// `cancelled` is set. Yields `(input index, available)` in completion
    /// order.
    async fn drain(
        &self,
        cache: &AvailabilityCache,
        venue_ids: Vec<String>,
        limit: usize,
        cancelled: Option<&AtomicBool>,
    ) -> Vec<(usize, bool)> {
        let total = venue_ids.len();
        let start = Instant::now();
        metrics::histogram!(obs::BATCH_SIZE).record(total as f64);
        debug!(venues = total, limit, "availability batch started");

        let settled: Vec<(usize, bool)> = stream::iter(venue_ids.into_iter().enumerate())
            .take_while(|_| future::ready(!cancelled.is_some_and(|c| c.load(Ordering::Acquire))))
            .map(|(idx, venue_id)| {
                let resolver = self.clone();
                let cache = cache.clone();
                async move { (idx, resolver.lookup(&cache, &venue_id).await) }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        metrics::histogram!(obs::BATCH_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        debug!(
            venues = total,
            settled = settled.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "availability batch drained"
        );
        settled
    }
}

/// Place completion-ordered results back at their input positions.
fn in_input_order(total: usize, settled: Vec<(usize, bool)>) -> Vec<bool> {
    let mut results = vec![false; total];
    for (idx, available) in settled {
        results[idx] = available;
    }
    results
}
