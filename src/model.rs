use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::resolver::ResolveError;

/// Unix milliseconds, UTC. The only time type.
pub type Ms = i64;

pub const DAY_MS: Ms = 86_400_000;

/// Closed interval `[from, to]` occupied by one reservation.
///
/// Immutable once built; `from <= to` is checked by [`BookingRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BookingRange {
    from: Ms,
    to: Ms,
}

impl BookingRange {
    pub fn new(from: Ms, to: Ms) -> Result<Self, ResolveError> {
        if from > to {
            return Err(ResolveError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> Ms {
        self.from
    }

    pub fn to(&self) -> Ms {
        self.to
    }

    pub fn overlaps(&self, other: &BookingRange) -> bool {
        crate::resolver::overlaps(self.from, self.to, other.from, other.to)
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.from <= t && t <= self.to
    }

    /// Both ends floored to midnight UTC.
    pub fn to_days(&self) -> Self {
        // Flooring is monotonic, so the ordering invariant survives.
        Self {
            from: day_start(self.from),
            to: day_start(self.to),
        }
    }
}

/// One availability question: is `venue_id` free for `range`?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueAvailabilityQuery {
    pub venue_id: String,
    pub range: BookingRange,
}

impl VenueAvailabilityQuery {
    pub fn new(venue_id: impl Into<String>, range: BookingRange) -> Self {
        Self {
            venue_id: venue_id.into(),
            range,
        }
    }
}

/// Booking as returned by the data source. Only the dates matter here;
/// anything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBooking {
    pub date_from: String,
    pub date_to: String,
}

impl RawBooking {
    pub fn new(date_from: impl Into<String>, date_to: impl Into<String>) -> Self {
        Self {
            date_from: date_from.into(),
            date_to: date_to.into(),
        }
    }
}

// ── Search-stage types ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A bookable listing, trimmed to the fields search and availability use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_guests: u32,
    #[serde(default)]
    pub location: Option<VenueLocation>,
}

// ── Date helpers ─────────────────────────────────────────────────

/// Floor an instant to midnight UTC.
pub fn day_start(t: Ms) -> Ms {
    t.div_euclid(DAY_MS) * DAY_MS
}

/// Parse an ISO-8601 instant. Accepts RFC 3339 timestamps and bare
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_instant(s: &str) -> Option<Ms> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Render an instant as `YYYY-MM-DD` (UTC).
pub fn format_day(t: Ms) -> String {
    DateTime::from_timestamp_millis(t)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| t.to_string())
}
