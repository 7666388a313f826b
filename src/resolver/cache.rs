use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::model::BookingRange;

/// Per-window memo of venue availability.
///
/// A cache answers for exactly one date window, fixed at construction.
/// Clones share the same entries. There is no eviction: drop the cache and
/// build a new one when the window changes.
///
/// Each venue gets a `OnceCell`, so concurrent first lookups of one venue
/// wait on a single fetch instead of racing.
#[derive(Clone)]
pub struct AvailabilityCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    window: BookingRange,
    entries: DashMap<String, Arc<OnceCell<bool>>>,
}

impl AvailabilityCache {
    pub fn new(window: BookingRange) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                window,
                entries: DashMap::new(),
            }),
        }
    }

    pub fn window(&self) -> BookingRange {
        self.inner.window
    }

    /// Settled answer for a venue, if any. Lookups still in flight read as `None`.
    pub fn get(&self, venue_id: &str) -> Option<bool> {
        self.inner
            .entries
            .get(venue_id)
            .and_then(|cell| cell.get().copied())
    }

    /// Seed an answer. Ignored if the venue is already settled or being fetched.
    pub fn insert(&self, venue_id: &str, available: bool) {
        let _ = self.cell(venue_id).set(available);
    }

    /// Number of settled entries.
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .iter()
            .filter(|e| e.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Settled entries, sorted by venue id.
    pub fn entries(&self) -> Vec<(String, bool)> {
        let mut out: Vec<(String, bool)> = self
            .inner
            .entries
            .iter()
            .filter_map(|e| e.value().get().map(|v| (e.key().clone(), *v)))
            .collect();
        out.sort();
        out
    }

    /// Cell for a venue, created on first use. The map guard is released
    /// before returning so callers can await on the cell.
    pub(super) fn cell(&self, venue_id: &str) -> Arc<OnceCell<bool>> {
        if let Some(cell) = self.inner.entries.get(venue_id) {
            return cell.value().clone();
        }
        self.inner
            .entries
            .entry(venue_id.to_string())
            .or_default()
            .value()
            .clone()
    }
}

impl std::fmt::Debug for AvailabilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityCache")
            .field("window", &self.inner.window)
            .field("settled", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> BookingRange {
        BookingRange::new(1_000, 2_000).unwrap()
    }

    #[test]
    fn empty_cache() {
        let cache = AvailabilityCache::new(window());
        assert!(cache.is_empty());
        assert_eq!(cache.get("v1"), None);
        assert_eq!(cache.window(), window());
    }

    #[test]
    fn insert_then_get() {
        let cache = AvailabilityCache::new(window());
        cache.insert("v1", false);
        cache.insert("v2", true);
        assert_eq!(cache.get("v1"), Some(false));
        assert_eq!(cache.get("v2"), Some(true));
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.entries(),
            vec![("v1".to_string(), false), ("v2".to_string(), true)]
        );
    }

    #[test]
    fn first_answer_wins() {
        let cache = AvailabilityCache::new(window());
        cache.insert("v1", false);
        cache.insert("v1", true);
        assert_eq!(cache.get("v1"), Some(false));
    }

    #[test]
    fn clones_share_entries() {
        let cache = AvailabilityCache::new(window());
        let other = cache.clone();
        other.insert("v1", true);
        assert_eq!(cache.get("v1"), Some(true));
    }

    #[test]
    fn unsettled_cell_not_counted() {
        let cache = AvailabilityCache::new(window());
        let _cell = cache.cell("pending");
        assert!(cache.is_empty());
        assert_eq!(cache.get("pending"), None);
    }
}
