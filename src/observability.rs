use std::net::SocketAddr;

// ── Availability checks ─────────────────────────────────────────

/// Counter: single-venue checks. Labels: outcome (available, conflict, fail_open).
pub const CHECKS_TOTAL: &str = "vacancy_checks_total";

/// Counter: source failures swallowed by fail-open. Labels: kind.
pub const SOURCE_ERRORS_TOTAL: &str = "vacancy_source_errors_total";

/// Histogram: booking fetch latency in seconds.
pub const FETCH_DURATION_SECONDS: &str = "vacancy_fetch_duration_seconds";

/// Gauge: booking fetches currently in flight.
pub const FETCHES_IN_FLIGHT: &str = "vacancy_fetches_in_flight";

// ── Cache ───────────────────────────────────────────────────────

pub const CACHE_HITS_TOTAL: &str = "vacancy_cache_hits_total";

pub const CACHE_MISSES_TOTAL: &str = "vacancy_cache_misses_total";

// ── Batches ─────────────────────────────────────────────────────

/// Histogram: venues per batch.
pub const BATCH_SIZE: &str = "vacancy_batch_size";

/// Histogram: batch wall time in seconds.
pub const BATCH_DURATION_SECONDS: &str = "vacancy_batch_duration_seconds";

/// Counter: batches cancelled before completion.
pub const BATCHES_CANCELLED_TOTAL: &str = "vacancy_batches_cancelled_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
