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

use crate::model::{AlternateResponse, DefaultResponse, WeatherResponse};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

const NAMESPACE: &str = "openmeteo";

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LocationLabels {
    location: String,
}

impl LocationLabels {
    pub fn new<S: Into<String>>(location: S) -> Self {
        LocationLabels {
            location: location.into(),
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BuildLabels {
    version: String,
}

type GaugeFamily = Family<LocationLabels, Gauge<f64, AtomicU64>>;

/// Holder for metrics that are set from current weather responses and from the
/// bookkeeping of each scrape.
///
/// All metrics are created and registered upon call to `ExporterMetrics::new()` and
/// share the prefix "openmeteo_". Weather gauges have a "location" label set to the
/// configured name of the location. Counters get the "_total" suffix when encoded.
#[derive(Debug)]
pub struct ExporterMetrics {
    temperature: GaugeFamily,
    apparent_temperature: GaugeFamily,
    relative_humidity: GaugeFamily,
    precipitation: GaugeFamily,
    rain: GaugeFamily,
    showers: GaugeFamily,
    snowfall: GaugeFamily,
    cloud_cover: GaugeFamily,
    surface_pressure: GaugeFamily,
    pressure_msl: GaugeFamily,
    wind_speed: GaugeFamily,
    wind_dir: GaugeFamily,
    wind_gusts: GaugeFamily,

    total_scrapes: Counter,
    scrape_errors: Counter,
    cache_hit: Family<LocationLabels, Counter>,
    http_rx_bytes: Counter,
    http_fetch_duration: Histogram,
}

impl ExporterMetrics {
    /// Create a new `ExporterMetrics` and register each metric with the provided `Registry`.
    pub fn new(reg: &mut Registry) -> Self {
        let reg = reg.sub_registry_with_prefix(NAMESPACE);

        let build_info = Family::<BuildLabels, Gauge>::default();
        build_info
            .get_or_create(&BuildLabels {
                version: env!("CARGO_PKG_VERSION").to_owned(),
            })
            .set(1);
        reg.register("exporter_build_info", "Exporter version information", build_info);

        let temperature = GaugeFamily::default();
        let apparent_temperature = GaugeFamily::default();
        let relative_humidity = GaugeFamily::default();
        let precipitation = GaugeFamily::default();
        let rain = GaugeFamily::default();
        let showers = GaugeFamily::default();
        let snowfall = GaugeFamily::default();
        let cloud_cover = GaugeFamily::default();
        let surface_pressure = GaugeFamily::default();
        let pressure_msl = GaugeFamily::default();
        let wind_speed = GaugeFamily::default();
        let wind_dir = GaugeFamily::default();
        let wind_gusts = GaugeFamily::default();

        reg.register("current_temperature", "The current temperature", temperature.clone());
        reg.register(
            "current_apparent_temperature",
            "The apparent temperature",
            apparent_temperature.clone(),
        );
        reg.register(
            "current_relative_humidity",
            "The relative humidity (0-100)",
            relative_humidity.clone(),
        );
        reg.register(
            "current_precipitation",
            "Total precipitation (rain, showers, snow)",
            precipitation.clone(),
        );
        reg.register("current_rain", "Rain from large scale weather systems", rain.clone());
        reg.register("current_showers", "Showers from convective precipitation", showers.clone());
        reg.register("current_snowfall", "The snowfall", snowfall.clone());
        reg.register(
            "current_cloud_cover",
            "Total cloud cover as an area fraction",
            cloud_cover.clone(),
        );
        reg.register(
            "current_surface_pressure",
            "Atmospheric air pressure at surface",
            surface_pressure.clone(),
        );
        reg.register(
            "current_pressure_msl",
            "Atmospheric air pressure reduced to mean sea level",
            pressure_msl.clone(),
        );
        reg.register("current_wind_speed", "The current wind speed", wind_speed.clone());
        reg.register("current_wind_dir", "The current wind direction", wind_dir.clone());
        reg.register(
            "current_wind_gusts",
            "Wind gusts at 10 meters above ground",
            wind_gusts.clone(),
        );

        let total_scrapes = Counter::default();
        let scrape_errors = Counter::default();
        let cache_hit = Family::<LocationLabels, Counter>::default();
        let http_rx_bytes = Counter::default();
        let http_fetch_duration = Histogram::new(exponential_buckets(0.05, 2.0, 10));

        reg.register(
            "exporter_total_scrapes",
            "Total number of times this exporter was scraped for metrics",
            total_scrapes.clone(),
        );
        reg.register(
            "exporter_scrape_errors",
            "Total number of times an error occurred during scraping operation",
            scrape_errors.clone(),
        );
        reg.register(
            "exporter_cache_hit",
            "Total number of times cache was hit",
            cache_hit.clone(),
        );
        reg.register(
            "exporter_http_rx_bytes",
            "Total bytes received from api.open-meteo.com",
            http_rx_bytes.clone(),
        );
        reg.register(
            "exporter_http_fetch_duration",
            "Time spent fetching data from api.open-meteo.com per scrape, in seconds",
            http_fetch_duration.clone(),
        );

        Self {
            temperature,
            apparent_temperature,
            relative_humidity,
            precipitation,
            rain,
            showers,
            snowfall,
            cloud_cover,
            surface_pressure,
            pressure_msl,
            wind_speed,
            wind_dir,
            wind_gusts,
            total_scrapes,
            scrape_errors,
            cache_hit,
            http_rx_bytes,
            http_fetch_duration,
        }
    }

    pub fn scrape(&self) {
        self.total_scrapes.inc();
    }

    pub fn scrape_error(&self) {
        self.scrape_errors.inc();
    }

    pub fn cache_hit(&self, location: &str) {
        self.cache_hit.get_or_create(&LocationLabels::new(location)).inc();
    }

    pub fn bytes_received(&self, num: usize) {
        self.http_rx_bytes.inc_by(num as u64);
    }

    pub fn fetch_duration(&self, elapsed: Duration) {
        self.http_fetch_duration.observe(elapsed.as_secs_f64());
    }

    /// Set gauges from the provided response.
    ///
    /// Fields that are missing from an alternate response leave the gauge for the
    /// location untouched, keeping whatever value it was last set to.
    pub fn observe(&self, location: &str, response: &WeatherResponse) {
        let labels = LocationLabels::new(location);
        match response {
            WeatherResponse::Default(r) => self.observe_default(&labels, r),
            WeatherResponse::Alternate(r) => self.observe_alternate(&labels, r),
        }
    }

    fn observe_default(&self, labels: &LocationLabels, res: &DefaultResponse) {
        self.temperature.get_or_create(labels).set(res.current.temperature);
        self.wind_speed.get_or_create(labels).set(res.current.wind_speed);
        self.wind_dir.get_or_create(labels).set(res.current.wind_direction);
    }

    fn observe_alternate(&self, labels: &LocationLabels, res: &AlternateResponse) {
        let cur = &res.current;
        self.set_from_value(labels, &self.temperature, cur.temperature);
        self.set_from_value(labels, &self.apparent_temperature, cur.apparent_temperature);
        self.set_from_value(labels, &self.relative_humidity, cur.relative_humidity);
        self.set_from_value(labels, &self.precipitation, cur.precipitation);
        self.set_from_value(labels, &self.rain, cur.rain);
        self.set_from_value(labels, &self.showers, cur.showers);
        self.set_from_value(labels, &self.snowfall, cur.snowfall);
        self.set_from_value(labels, &self.cloud_cover, cur.cloud_cover);
        self.set_from_value(labels, &self.surface_pressure, cur.surface_pressure);
        self.set_from_value(labels, &self.pressure_msl, cur.pressure_msl);
        self.set_from_value(labels, &self.wind_speed, cur.wind_speed);
        self.set_from_value(labels, &self.wind_dir, cur.wind_direction);
        self.set_from_value(labels, &self.wind_gusts, cur.wind_gusts);
    }

    fn set_from_value(&self, labels: &LocationLabels, gauge: &GaugeFamily, value: Option<f64>) {
        if let Some(v) = value {
            gauge.get_or_create(labels).set(v);
        }
    }
}
