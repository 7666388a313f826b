/// Concurrency used when the caller does not pick one.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Upper bound on simultaneous availability fetches per batch.
pub const MAX_CONCURRENCY: usize = 64;

pub const MAX_VENUE_ID_LEN: usize = 256;

/// Max venue ids in a single batch.
pub const MAX_BATCH_VENUES: usize = 10_000;

/// Max pages followed when a source paginates.
pub const MAX_PAGES: usize = 1_000;

/// Max days enumerated per booking range for calendar rendering (~10 years).
pub const MAX_CALENDAR_DAYS: i64 = 3_660;
