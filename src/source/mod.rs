//! Booking data sources: the one external read capability the resolver
//! depends on.

mod http;
mod memory;
mod timeout;

pub use http::{HttpBookingSource, SourceMode};
pub use memory::MemoryBookingSource;
pub use timeout::TimeoutSource;

use std::time::Duration;

use async_trait::async_trait;

use crate::model::{BookingRange, RawBooking, parse_instant};

/// Supplies a venue's full current booking set.
///
/// Implementations must be idempotent and exhaust any pagination before
/// returning.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn fetch_venue_bookings(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure (connect, DNS, TLS, reset).
    Http(String),
    /// Non-2xx response.
    Status(u16),
    /// Body did not have the expected shape.
    Malformed(String),
    Timeout(Duration),
    NotFound(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Http(e) => write!(f, "request failed: {e}"),
            SourceError::Status(code) => write!(f, "unexpected status {code}"),
            SourceError::Malformed(e) => write!(f, "malformed response: {e}"),
            SourceError::Timeout(d) => write!(f, "timed out after {}ms", d.as_millis()),
            SourceError::NotFound(id) => write!(f, "venue not found: {id}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "http",
            SourceError::Status(_) => "status",
            SourceError::Malformed(_) => "malformed",
            SourceError::Timeout(_) => "timeout",
            SourceError::NotFound(_) => "not_found",
        }
    }
}

/// Convert wire bookings into validated ranges. A single bad entry makes
/// the whole response malformed.
pub fn decode_bookings(raw: &[RawBooking]) -> Result<Vec<BookingRange>, SourceError> {
    raw.iter()
        .map(|b| {
            let from = parse_instant(&b.date_from)
                .ok_or_else(|| SourceError::Malformed(format!("bad dateFrom {:?}", b.date_from)))?;
            let to = parse_instant(&b.date_to)
                .ok_or_else(|| SourceError::Malformed(format!("bad dateTo {:?}", b.date_to)))?;
            BookingRange::new(from, to).map_err(|e| SourceError::Malformed(e.to_string()))
        })
        .collect()
}
