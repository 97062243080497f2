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

//! Prometheus metrics exporter for open-meteo.com
//!
//! ## Features
//!
//! `openmeteo_exporter` fetches current weather conditions for a list of locations using the
//! [open-meteo.com] forecast API and emits them as Prometheus metrics. Conditions are fetched
//! when Prometheus scrapes the exporter and cached per location for a configurable number of
//! minutes so that scrapes don't result in an API request every time. The following metrics
//! are emitted when available. Locations using the `default` method only report temperature,
//! wind speed, and wind direction.
//!
//! * `openmeteo_current_temperature{location=$NAME}` - Temperature, in degrees celsius.
//! * `openmeteo_current_apparent_temperature{location=$NAME}` - Apparent temperature, in degrees celsius.
//! * `openmeteo_current_relative_humidity{location=$NAME}` - Relative humidity (0-100).
//! * `openmeteo_current_precipitation{location=$NAME}` - Precipitation, in millimeters.
//! * `openmeteo_current_rain{location=$NAME}` - Rain, in millimeters.
//! * `openmeteo_current_showers{location=$NAME}` - Showers, in millimeters.
//! * `openmeteo_current_snowfall{location=$NAME}` - Snowfall, in centimeters.
//! * `openmeteo_current_cloud_cover{location=$NAME}` - Cloud cover (0-100).
//! * `openmeteo_current_surface_pressure{location=$NAME}` - Surface pressure, in hectopascals.
//! * `openmeteo_current_pressure_msl{location=$NAME}` - Mean sea level pressure, in hectopascals.
//! * `openmeteo_current_wind_speed{location=$NAME}` - Wind speed, in km/h.
//! * `openmeteo_current_wind_dir{location=$NAME}` - Wind direction, in degrees.
//! * `openmeteo_current_wind_gusts{location=$NAME}` - Wind gusts, in km/h.
//!
//! Metrics about the exporter itself are emitted as well.
//!
//! * `openmeteo_exporter_total_scrapes_total` - Number of times the exporter was scraped.
//! * `openmeteo_exporter_scrape_errors_total` - Number of failed fetches for any location.
//! * `openmeteo_exporter_cache_hit_total{location=$NAME}` - Number of scrapes served from cache.
//! * `openmeteo_exporter_http_rx_bytes_total` - Bytes received from the API.
//! * `openmeteo_exporter_http_fetch_duration` - Histogram of seconds spent fetching per scrape.
//! * `openmeteo_exporter_build_info{version=$VERSION}` - Exporter version.
//!
//! [open-meteo.com]: https://open-meteo.com/en/docs
//!
//! ## Build
//!
//! `openmeteo_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Configuration
//!
//! Locations are read from a TOML file, `config.toml` in the current directory by default. Each
//! location needs a unique name, which is used as the `location` label, and coordinates. The
//! `ttl_minutes` setting controls how long a response is reused (10 minutes if unset) and
//! `method` selects between the `default` and `alternate` API responses.
//!
//! ```toml
//! [[locations]]
//! name = "vienna"
//! latitude = 48.2
//! longitude = 16.4
//!
//! [[locations]]
//! name = "prague"
//! latitude = 50.08
//! longitude = 14.43
//! ttl_minutes = 15
//! method = "alternate"
//! ```
//!
//! ### Run
//!
//! ```text
//! ./openmeteo_exporter --config-file /etc/openmeteo_exporter/config.toml
//! ```
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `9113` at `/metrics`. Once `openmeteo_exporter`
//! is running, configure scrapes of it by your Prometheus server. Add the host running
//! `openmeteo_exporter` as a target under the Prometheus `scrape_configs` section as described
//! by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     60s
//!   evaluation_interval: 60s
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: openmeteo_exporter
//!   static_configs:
//!   - targets: ['example:9113']
//! ```
//!

pub mod cache;
pub mod client;
pub mod config;
pub mod exporter;
pub mod http;
pub mod metrics;
pub mod model;
