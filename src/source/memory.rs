use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::RawBooking;

use super::{BookingSource, SourceError};

/// In-process booking table. Backs offline runs (a JSON file of bookings)
/// and tests.
#[derive(Default)]
pub struct MemoryBookingSource {
    venues: DashMap<String, Vec<RawBooking>>,
}

impl MemoryBookingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "<venueId>": [ { "dateFrom": .., "dateTo": .. }, .. ], .. }`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let map: HashMap<String, Vec<RawBooking>> = serde_json::from_str(json)?;
        Ok(Self {
            venues: map.into_iter().collect(),
        })
    }

    /// Replace a venue's bookings.
    pub fn insert(&self, venue_id: impl Into<String>, bookings: Vec<RawBooking>) {
        self.venues.insert(venue_id.into(), bookings);
    }

    /// Append one booking, creating the venue if needed.
    pub fn add_booking(&self, venue_id: &str, booking: RawBooking) {
        self.venues
            .entry(venue_id.to_string())
            .or_default()
            .push(booking);
    }

    pub fn venue_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.venues.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl BookingSource for MemoryBookingSource {
    async fn fetch_venue_bookings(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError> {
        self.venues
            .get(venue_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| SourceError::NotFound(venue_id.to_string()))
    }
}
