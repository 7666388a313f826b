use std::time::Duration;

use async_trait::async_trait;

use crate::model::RawBooking;

use super::{BookingSource, SourceError};

/// Bounds every fetch of the wrapped source. A hung fetch turns into
/// `SourceError::Timeout` instead of pinning a batch slot forever.
pub struct TimeoutSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutSource<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BookingSource> BookingSource for TimeoutSource<S> {
    async fn fetch_venue_bookings(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch_venue_bookings(venue_id)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.timeout)),
        }
    }
}
