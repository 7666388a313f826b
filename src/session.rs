use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::limits::MAX_CONCURRENCY;
use crate::model::{BookingRange, Venue};
use crate::resolver::{AvailabilityCache, BatchHandle, CancelToken, ResolveError, Resolver};

/// Monotonic token naming one search request. Results tagged with an older
/// generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// One browsing session: owns the availability cache for the selected
/// date window and the query generation counter.
///
/// Changing the window bumps the generation and replaces the cache, since
/// cached answers only hold for the window they were computed against.
/// Batches started under the old window are cancelled.
pub struct SearchSession {
    resolver: Resolver,
    concurrency: usize,
    generation: Arc<AtomicU64>,
    cache: Option<AvailabilityCache>,
    // Cancel switches of batches started under the active window.
    batches: Mutex<Vec<CancelToken>>,
}

/// Batch tagged with the generation that started it. Dropping it before
/// `join` completes cancels the batch.
pub struct SessionBatch {
    generation: Generation,
    live: Arc<AtomicU64>,
    handle: BatchHandle,
}

impl SessionBatch {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// False once the session has moved on to another query.
    pub fn is_current(&self) -> bool {
        self.live.load(Ordering::Acquire) == self.generation.0
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.handle.cancel_token()
    }

    /// Results, or `None` if cancelled or superseded by the time the batch
    /// finished.
    pub async fn join(self) -> Result<Option<Vec<bool>>, ResolveError> {
        let generation = self.generation;
        let live = self.live;
        let results = self.handle.join().await?;
        if live.load(Ordering::Acquire) != generation.0 {
            debug!(%generation, "dropping stale availability results");
            return Ok(None);
        }
        Ok(results)
    }
}

impl SearchSession {
    pub fn new(resolver: Resolver, concurrency: usize) -> Result<Self, ResolveError> {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(ResolveError::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            resolver,
            concurrency,
            generation: Arc::new(AtomicU64::new(0)),
            cache: None,
            batches: Mutex::new(Vec::new()),
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn window(&self) -> Option<BookingRange> {
        self.cache.as_ref().map(AvailabilityCache::window)
    }

    pub fn cache(&self) -> Option<&AvailabilityCache> {
        self.cache.as_ref()
    }

    pub fn current(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Move to a new generation and stop launching work for the old one.
    fn bump(&mut self) -> Generation {
        let generation = Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1);
        let superseded = std::mem::take(
            self.batches
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if !superseded.is_empty() {
            debug!(%generation, batches = superseded.len(), "cancelling superseded batches");
        }
        for token in superseded {
            token.cancel();
        }
        generation
    }

    /// Select a check-in/check-out window. Re-selecting the active window
    /// keeps the cache and generation.
    pub fn set_window(&mut self, window: BookingRange) -> Generation {
        if self.window() == Some(window) {
            return self.current();
        }
        self.cache = Some(AvailabilityCache::new(window));
        let generation = self.bump();
        debug!(%generation, from = window.from(), to = window.to(), "search window changed");
        generation
    }

    /// Drop the date filter entirely.
    pub fn clear_window(&mut self) -> Generation {
        self.cache = None;
        let generation = self.bump();
        debug!(%generation, "search window cleared");
        generation
    }

    /// Spawn a batch against the active window, tagged with the current generation.
    pub fn start_batch(&self, venue_ids: Vec<String>) -> Result<SessionBatch, ResolveError> {
        let cache = self.cache.as_ref().ok_or(ResolveError::NoWindow)?;
        let handle =
            self.resolver
                .spawn_batch(cache, venue_ids, &cache.window(), self.concurrency)?;
        let mut batches = self.batches.lock().unwrap_or_else(PoisonError::into_inner);
        batches.retain(|token| !token.is_cancelled());
        batches.push(handle.cancel_token());
        drop(batches);
        Ok(SessionBatch {
            generation: self.current(),
            live: self.generation.clone(),
            handle,
        })
    }

    /// Await a batch and apply the staleness check.
    pub async fn settle(&self, batch: SessionBatch) -> Result<Option<Vec<bool>>, ResolveError> {
        batch.join().await
    }

    /// Keep the venues free for the active window, in input order. With no
    /// window every venue passes.
    pub async fn filter_available(&self, venues: &[Venue]) -> Result<Vec<Venue>, ResolveError> {
        let Some(cache) = &self.cache else {
            return Ok(venues.to_vec());
        };
        let ids: Vec<String> = venues.iter().map(|v| v.id.clone()).collect();
        let flags = self
            .resolver
            .resolve_batch(cache, &ids, &cache.window(), self.concurrency)
            .await?;
        Ok(venues
            .iter()
            .zip(flags)
            .filter_map(|(v, available)| available.then(|| v.clone()))
            .collect())
    }
}
