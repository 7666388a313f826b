use crate::model::Ms;

/// Caller contract violations. Data-source failures never show up here;
/// they resolve to "available" instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    EmptyVenueId,
    VenueIdTooLong(usize),
    InvalidRange { from: Ms, to: Ms },
    /// Cache was built for a different window than the one queried.
    WindowMismatch,
    /// Session has no active date window.
    NoWindow,
    InvalidConcurrency(usize),
    LimitExceeded(&'static str),
    TaskFailed(String),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::EmptyVenueId => write!(f, "venue id must not be empty"),
            ResolveError::VenueIdTooLong(len) => write!(f, "venue id too long: {len} bytes"),
            ResolveError::InvalidRange { from, to } => {
                write!(f, "invalid range: from {from} is after to {to}")
            }
            ResolveError::WindowMismatch => {
                write!(f, "cache was built for a different date window")
            }
            ResolveError::NoWindow => write!(f, "no date window selected"),
            ResolveError::InvalidConcurrency(n) => {
                write!(f, "concurrency limit {n} out of range")
            }
            ResolveError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ResolveError::TaskFailed(e) => write!(f, "batch task failed: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {}
