use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::limits::MAX_PAGES;
use crate::model::RawBooking;

use super::{BookingSource, SourceError};

const API_KEY_HEADER: &str = "X-Noroff-API-Key";

/// Which endpoint the HTTP source reads bookings from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// `GET /holidaze/venues/{id}?_bookings=true`, one request per venue.
    #[default]
    Venue,
    /// `GET /holidaze/bookings?_venue=true&page=N`, following every page and
    /// keeping the venue's bookings.
    Paged,
}

impl std::str::FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "venue" => Ok(SourceMode::Venue),
            "paged" => Ok(SourceMode::Paged),
            other => Err(format!("unknown source mode: {other}")),
        }
    }
}

/// Reads bookings from the marketplace REST API.
pub struct HttpBookingSource {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    token: Option<String>,
    mode: SourceMode,
}

// ── Wire envelopes ───────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    is_last_page: bool,
    #[serde(default)]
    next_page: Option<u32>,
}

#[derive(Deserialize)]
struct VenueWithBookings {
    bookings: Option<Vec<RawBooking>>,
}

#[derive(Deserialize)]
struct VenueRef {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedBooking {
    date_from: String,
    date_to: String,
    #[serde(default)]
    venue: Option<VenueRef>,
}

impl HttpBookingSource {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    /// Reuse an existing client (connection pool) across sources.
    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            api_key: None,
            token: None,
            mode: SourceMode::default(),
        }
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn mode(mut self, mode: SourceMode) -> Self {
        self.mode = mode;
        self
    }

    /// `{api_base}/{segments..}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SourceError::Http(format!("bad api base {:?}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|()| SourceError::Http(format!("api base cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>, SourceError> {
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Malformed(e.to_string()))
    }

    async fn fetch_from_venue(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError> {
        let mut url = self.url(&["holidaze", "venues", venue_id])?;
        url.query_pairs_mut().append_pair("_bookings", "true");
        let envelope: Envelope<VenueWithBookings> = self.get_json(url).await?;
        envelope
            .data
            .bookings
            .ok_or_else(|| SourceError::Malformed("venue payload has no bookings".into()))
    }

    async fn fetch_paged(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError> {
        let mut collected = Vec::new();
        let mut page: u32 = 1;
        for _ in 0..MAX_PAGES {
            let mut url = self.url(&["holidaze", "bookings"])?;
            url.query_pairs_mut()
                .append_pair("_venue", "true")
                .append_pair("page", &page.to_string());
            let envelope: Envelope<Vec<ListedBooking>> = self.get_json(url).await?;

            collected.extend(
                envelope
                    .data
                    .into_iter()
                    .filter(|b| b.venue.as_ref().is_some_and(|v| v.id == venue_id))
                    .map(|b| RawBooking::new(b.date_from, b.date_to)),
            );

            let meta = envelope
                .meta
                .ok_or_else(|| SourceError::Malformed("paged response has no meta".into()))?;
            if meta.is_last_page {
                return Ok(collected);
            }
            page = meta
                .next_page
                .ok_or_else(|| SourceError::Malformed("meta.nextPage missing".into()))?;
        }
        Err(SourceError::Malformed(format!("more than {MAX_PAGES} pages")))
    }
}

#[async_trait]
impl BookingSource for HttpBookingSource {
    async fn fetch_venue_bookings(&self, venue_id: &str) -> Result<Vec<RawBooking>, SourceError> {
        match self.mode {
            SourceMode::Venue => self.fetch_from_venue(venue_id).await,
            SourceMode::Paged => self.fetch_paged(venue_id).await,
        }
    }
}
