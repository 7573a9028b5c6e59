// Geocoding - free text → coordinate through a rate-limited external service
//
// The resolver owns the rate-limiter state (last dispatch time) for the
// duration of one resolve call and guarantees a minimum spacing between
// successive lookups, per the service's usage policy. Per-item failures
// are dropped, never escalated.

use crate::error::{MapError, Result};
use crate::model::{Coordinate, LocationRequest, ResolvedLocation};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";
const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Minimum spacing between successive geocoding dispatches
pub const MIN_LOOKUP_DELAY: Duration = Duration::from_millis(500);

/// Attempts per item: one initial lookup plus one retry on transient
/// unavailability. "No match" is deterministic and never retried.
pub const MAX_LOOKUP_ATTEMPTS: u32 = 2;

// ============================================================================
// GEOCODE OUTCOME
// ============================================================================

/// Explicit three-way result of a single lookup. "Service down" and
/// "nothing matched" are distinct conditions: only the former is worth
/// retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    /// Best match for the query
    Found(Coordinate),

    /// The service answered but found nothing for the text
    NoMatch,

    /// Transient failure: transport error, timeout, or non-success status
    Unavailable,
}

/// A service that resolves free text to at most one coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> GeocodeOutcome;
}

// ============================================================================
// NOMINATIM CLIENT
// ============================================================================

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// HTTP geocoder backed by a Nominatim-compatible search endpoint
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_BASE)
    }

    /// Point the client at a different endpoint (self-hosted instance)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("friends-map/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .map_err(MapError::HttpClient)?;

        Ok(NominatimGeocoder {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> GeocodeOutcome {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(query, error = %e, "geocode request failed");
                return GeocodeOutcome::Unavailable;
            }
        };

        if !response.status().is_success() {
            debug!(query, status = %response.status(), "geocode service error");
            return GeocodeOutcome::Unavailable;
        }

        match response.json::<Vec<NominatimPlace>>().await {
            Ok(places) => outcome_from_places(&places),
            Err(e) => {
                debug!(query, error = %e, "geocode response not parseable");
                GeocodeOutcome::Unavailable
            }
        }
    }
}

/// Keep only the first (best) match; a malformed coordinate counts as
/// no match rather than a transient failure.
fn outcome_from_places(places: &[NominatimPlace]) -> GeocodeOutcome {
    let place = match places.first() {
        Some(place) => place,
        None => return GeocodeOutcome::NoMatch,
    };

    match (place.lat.parse::<f64>(), place.lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) => GeocodeOutcome::Found(Coordinate { lat, lon }),
        _ => GeocodeOutcome::NoMatch,
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves a batch of location requests, pacing dispatches and
/// silently dropping items that cannot be resolved.
pub struct Resolver<G> {
    geocoder: G,
    min_delay: Duration,
    max_attempts: u32,
    last_dispatch: Mutex<Option<Instant>>,
}

impl<G: Geocoder> Resolver<G> {
    pub fn new(geocoder: G) -> Self {
        Resolver {
            geocoder,
            min_delay: MIN_LOOKUP_DELAY,
            max_attempts: MAX_LOOKUP_ATTEMPTS,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Override the minimum inter-lookup delay (tests, self-hosted
    /// endpoints with their own limits)
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Resolve each request to a coordinate. Output order follows input
    /// order; unresolvable items are dropped, never errors.
    pub async fn resolve(&self, requests: &[LocationRequest]) -> Vec<ResolvedLocation> {
        let mut resolved = Vec::with_capacity(requests.len());

        for request in requests {
            match self.resolve_one(request).await {
                Some(coordinate) => {
                    debug!(
                        entity = %request.entity_name,
                        lat = coordinate.lat,
                        lon = coordinate.lon,
                        "location resolved"
                    );
                    resolved.push(ResolvedLocation {
                        entity_name: request.entity_name.clone(),
                        raw_location: request.raw_location.clone(),
                        coordinate,
                    });
                }
                None => {
                    warn!(
                        entity = %request.entity_name,
                        location = %request.raw_location,
                        "could not resolve location, dropping"
                    );
                }
            }
        }

        resolved
    }

    async fn resolve_one(&self, request: &LocationRequest) -> Option<Coordinate> {
        for attempt in 1..=self.max_attempts {
            self.pace().await;

            match self.geocoder.lookup(&request.raw_location).await {
                GeocodeOutcome::Found(coordinate) => return Some(coordinate),
                GeocodeOutcome::NoMatch => return None,
                GeocodeOutcome::Unavailable => {
                    debug!(
                        entity = %request.entity_name,
                        attempt,
                        "geocode service unavailable"
                    );
                }
            }
        }

        None
    }

    /// Enforce the minimum spacing between dispatches. The lock is
    /// released before sleeping; resolve runs lookups sequentially.
    async fn pace(&self) {
        let elapsed = {
            let last = self.last_dispatch.lock().unwrap();
            last.map(|instant| instant.elapsed())
        };

        if let Some(elapsed) = elapsed {
            if elapsed < self.min_delay {
                sleep(self.min_delay - elapsed).await;
            }
        }

        let mut last = self.last_dispatch.lock().unwrap();
        *last = Some(Instant::now());
    }
}

// ============================================================================
// TESTS
// ============================================================================
