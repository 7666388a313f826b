use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use vacancy::limits::DEFAULT_CONCURRENCY;
use vacancy::model::{BookingRange, Ms, format_day, parse_instant};
use vacancy::resolver::Resolver;
use vacancy::session::SearchSession;
use vacancy::source::{
    BookingSource, HttpBookingSource, MemoryBookingSource, SourceMode, TimeoutSource,
};

const USAGE: &str = "usage: vacancy <check-in> <check-out> [venue-id ...]";

fn parse_day(arg: &str) -> Result<Ms, Box<dyn std::error::Error>> {
    parse_instant(arg).ok_or_else(|| format!("invalid date: {arg:?}").into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("VACANCY_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    vacancy::observability::init(metrics_port)?;

    let api_base = std::env::var("VACANCY_API_BASE")
        .unwrap_or_else(|_| "https://v2.api.noroff.dev".into());
    let api_key = std::env::var("VACANCY_API_KEY").ok();
    let token = std::env::var("VACANCY_TOKEN").ok();
    let mode: SourceMode = std::env::var("VACANCY_SOURCE_MODE")
        .ok()
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();
    let bookings_file = std::env::var("VACANCY_BOOKINGS_FILE").ok();
    let concurrency: usize = std::env::var("VACANCY_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CONCURRENCY);
    let fetch_timeout = Duration::from_millis(
        std::env::var("VACANCY_FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [check_in, check_out, rest @ ..] = args.as_slice() else {
        return Err(USAGE.into());
    };
    // Day granularity: bookings are stored as midnight-UTC dates.
    let window = BookingRange::new(parse_day(check_in)?, parse_day(check_out)?)?.to_days();
    let mut venue_ids: Vec<String> = rest.to_vec();

    let source: Arc<dyn BookingSource> = match &bookings_file {
        Some(path) => {
            let memory = MemoryBookingSource::from_json(&std::fs::read_to_string(path)?)?;
            if venue_ids.is_empty() {
                venue_ids = memory.venue_ids();
            }
            info!("source: file {path}");
            Arc::new(TimeoutSource::new(memory, fetch_timeout))
        }
        None => {
            let http = HttpBookingSource::new(api_base.clone())
                .api_key(api_key)
                .token(token)
                .mode(mode);
            info!("source: {api_base} ({mode:?})");
            Arc::new(TimeoutSource::new(http, fetch_timeout))
        }
    };
    if venue_ids.is_empty() {
        return Err(USAGE.into());
    }

    info!(
        "checking {} venues for {}..{} (concurrency {concurrency}, timeout {}ms)",
        venue_ids.len(),
        format_day(window.from()),
        format_day(window.to()),
        fetch_timeout.as_millis()
    );

    let mut session = SearchSession::new(Resolver::new(source), concurrency)?;
    session.set_window(window);
    let batch = session.start_batch(venue_ids.clone())?;
    let cancel = batch.cancel_token();

    // Ctrl-c stops launching queued lookups and skips the report.
    let results = tokio::select! {
        results = session.settle(batch) => results?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, cancelling remaining lookups");
            cancel.cancel();
            None
        }
    };

    let Some(flags) = results else {
        info!("no results");
        return Ok(());
    };

    let mut available = 0usize;
    for (venue_id, ok) in venue_ids.iter().zip(&flags) {
        if *ok {
            available += 1;
        }
        let line = serde_json::json!({
            "venueId": venue_id,
            "available": ok,
            "checkIn": format_day(window.from()),
            "checkOut": format_day(window.to()),
        });
        println!("{line}");
    }
    info!("{available}/{} venues available", flags.len());
    Ok(())
}
