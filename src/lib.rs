//! Venue availability resolution for a stay-booking marketplace.
//!
//! Given a venue's existing reservations and a requested `[check-in,
//! check-out]` window, decide whether the window is free, singly or for
//! many venues at once with bounded concurrency and per-window caching.

pub mod limits;
pub mod model;
pub mod observability;
pub mod resolver;
pub mod search;
pub mod session;
pub mod source;
