//! Availability resolution: does a venue's booking set leave a date window free?
//!
//! The resolver only holds the booking source. Caches are owned by callers
//! (see [`crate::session::SearchSession`]) and passed in per call.

mod batch;
mod cache;
mod error;
mod overlap;

pub use batch::{BatchHandle, CancelToken};
pub use cache::AvailabilityCache;
pub use error::ResolveError;
pub use overlap::{booked_days, first_conflict, is_day_booked, overlaps};

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::limits::MAX_VENUE_ID_LEN;
use crate::model::*;
use crate::observability as obs;
use crate::source::{BookingSource, decode_bookings};

#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn BookingSource>,
}

pub(crate) fn validate_venue_id(venue_id: &str) -> Result<(), ResolveError> {
    if venue_id.is_empty() {
        return Err(ResolveError::EmptyVenueId);
    }
    if venue_id.len() > MAX_VENUE_ID_LEN {
        return Err(ResolveError::VenueIdTooLong(venue_id.len()));
    }
    Ok(())
}

/// Keeps the in-flight gauge honest when a fetch future is dropped mid-way.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::gauge!(obs::FETCHES_IN_FLIGHT).increment(1.0);
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::gauge!(obs::FETCHES_IN_FLIGHT).decrement(1.0);
    }
}

impl Resolver {
    pub fn new(source: Arc<dyn BookingSource>) -> Self {
        Self { source }
    }

    pub fn from_source<S: BookingSource + 'static>(source: S) -> Self {
        Self::new(Arc::new(source))
    }

    /// Fetch the venue's bookings and report whether `range` is free.
    ///
    /// Source failures (transport, status, timeout, malformed payload) fail
    /// open and yield `Ok(true)`. Only caller mistakes are returned as errors.
    pub async fn is_available(&self, venue_id: &str, range: &BookingRange) -> Result<bool, ResolveError> {
        validate_venue_id(venue_id)?;
        Ok(self.check(venue_id, range).await)
    }

    /// [`Resolver::is_available`] for a prepared query.
    pub async fn is_available_for(&self, query: &VenueAvailabilityQuery) -> Result<bool, ResolveError> {
        self.is_available(&query.venue_id, &query.range).await
    }

    /// Memoized [`Resolver::is_available`]. `range` must be the cache's window.
    pub async fn resolve_cached(
        &self,
        cache: &AvailabilityCache,
        venue_id: &str,
        range: &BookingRange,
    ) -> Result<bool, ResolveError> {
        validate_venue_id(venue_id)?;
        if cache.window() != *range {
            return Err(ResolveError::WindowMismatch);
        }
        Ok(self.lookup(cache, venue_id).await)
    }

    /// Cache lookup without validation. Concurrent misses for one venue share
    /// a single fetch.
    pub(super) async fn lookup(&self, cache: &AvailabilityCache, venue_id: &str) -> bool {
        let cell = cache.cell(venue_id);
        if let Some(available) = cell.get() {
            metrics::counter!(obs::CACHE_HITS_TOTAL).increment(1);
            debug!(venue_id, available, "availability cache hit");
            return *available;
        }
        let window = cache.window();
        *cell
            .get_or_init(|| async {
                metrics::counter!(obs::CACHE_MISSES_TOTAL).increment(1);
                self.check(venue_id, &window).await
            })
            .await
    }

    async fn check(&self, venue_id: &str, range: &BookingRange) -> bool {
        let start = Instant::now();
        let fetched = {
            let _in_flight = InFlight::enter();
            self.source.fetch_venue_bookings(venue_id).await
        };
        metrics::histogram!(obs::FETCH_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match fetched.and_then(|raw| decode_bookings(&raw)) {
            Ok(bookings) => match first_conflict(&bookings, range) {
                Some(clash) => {
                    debug!(
                        venue_id,
                        clash_from = clash.from(),
                        clash_to = clash.to(),
                        "venue booked for window"
                    );
                    metrics::counter!(obs::CHECKS_TOTAL, "outcome" => "conflict").increment(1);
                    false
                }
                None => {
                    metrics::counter!(obs::CHECKS_TOTAL, "outcome" => "available").increment(1);
                    true
                }
            },
            Err(e) => {
                // Fail open: a data-source hiccup must not hide inventory.
                // Booking creation re-checks authoritatively.
                warn!(venue_id, error = %e, "booking fetch failed, treating venue as available");
                metrics::counter!(obs::SOURCE_ERRORS_TOTAL, "kind" => e.kind()).increment(1);
                metrics::counter!(obs::CHECKS_TOTAL, "outcome" => "fail_open").increment(1);
                true
            }
        }
    }
}
