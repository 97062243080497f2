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

use crate::model::WeatherResponse;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// The most recent successfully decoded response for a location and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: WeatherResponse,
    pub fetched: Instant,
}

impl CacheEntry {
    pub fn new(response: WeatherResponse, fetched: Instant) -> Self {
        CacheEntry { response, fetched }
    }

    /// True if `now` is still before the end of `ttl` measured from the fetch time.
    /// A TTL that reaches past the largest representable instant never expires.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.fetched.checked_add(ttl).map_or(true, |end| now < end)
    }
}

/// Responses keyed by location name.
///
/// Entries are never evicted, they are only replaced by the next successful fetch
/// for the same location. Staleness is decided by callers at read time.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    pub fn put<S: Into<String>>(&mut self, name: S, entry: CacheEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
