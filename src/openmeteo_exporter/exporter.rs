// openmeteo_exporter - Prometheus metrics exporter for open-meteo.com
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::cache::{CacheEntry, ResponseCache};
use crate::client::{ClientError, WeatherSource};
use crate::config::Location;
use crate::metrics::ExporterMetrics;
use crate::model::{self, WeatherResponse};
use std::error;
use std::fmt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{Instrument, Level};

/// Reasons fetching current conditions for a single location can fail.
#[derive(Debug)]
pub enum ScrapeError {
    Fetch(ClientError),
    Decode(serde_json::Error),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "unable to fetch current weather: {}", e),
            Self::Decode(e) => write!(f, "unable to decode current weather: {}", e),
        }
    }
}

impl error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

/// Fetches current weather for each configured location when metrics are collected.
///
/// Responses are cached per location for the TTL of the location so that frequent
/// scrapes don't turn into frequent API requests. The cache is locked for an entire
/// collection so overlapping scrapes run one after the other.
#[derive(Debug)]
pub struct Exporter<S> {
    locations: Vec<Location>,
    source: S,
    metrics: ExporterMetrics,
    cache: Mutex<ResponseCache>,
}

impl<S> Exporter<S>
where
    S: WeatherSource,
{
    pub fn new(locations: Vec<Location>, source: S, metrics: ExporterMetrics) -> Self {
        Exporter {
            locations,
            source,
            metrics,
            cache: Mutex::new(ResponseCache::new()),
        }
    }

    /// Update metrics for every location, using cached responses when they are still
    /// fresh and fetching new ones otherwise.
    ///
    /// A failure for one location is logged and counted but doesn't prevent the
    /// remaining locations from being updated.
    pub async fn collect(&self) {
        let mut cache = self.cache.lock().await;
        let start = Instant::now();
        self.metrics.scrape();

        for location in self.locations.iter() {
            let span = tracing::span!(Level::DEBUG, "openmeteo_location", location = %location.name);
            match self.current(location, &mut cache).instrument(span).await {
                Ok(res) => self.metrics.observe(&location.name, &res),
                Err(e) => {
                    tracing::error!(message = "error while fetching data", location = %location.name, error = %e);
                    self.metrics.scrape_error();
                }
            }
        }

        self.metrics.fetch_duration(start.elapsed());
    }

    async fn current(&self, location: &Location, cache: &mut ResponseCache) -> Result<WeatherResponse, ScrapeError> {
        if let Some(entry) = cache.get(&location.name) {
            if entry.is_fresh(Instant::now(), location.ttl()) {
                debug_assert_eq!(location.method, entry.response.method());
                tracing::debug!(message = "using cached response", fetched = ?entry.fetched);
                self.metrics.cache_hit(&location.name);
                return Ok(entry.response.clone());
            }
        }

        let body = self.source.fetch(location).await.map_err(ScrapeError::Fetch)?;
        self.metrics.bytes_received(body.len());

        let res = model::decode(&body, location.method).map_err(ScrapeError::Decode)?;
        cache.put(location.name.clone(), CacheEntry::new(res.clone(), Instant::now()));
        tracing::debug!(message = "fetched new response", method = %location.method, num_bytes = body.len());

        Ok(res)
    }
}
