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

use crate::config::FetchMethod;
use serde::{Deserialize, Serialize};

/// Current conditions for a location as returned by either API shape.
///
/// The variant always matches the `FetchMethod` that was used to request it.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherResponse {
    Default(DefaultResponse),
    Alternate(AlternateResponse),
}

impl WeatherResponse {
    pub fn method(&self) -> FetchMethod {
        match self {
            Self::Default(_) => FetchMethod::Default,
            Self::Alternate(_) => FetchMethod::Alternate,
        }
    }
}

/// Parse a raw response body into the shape used by `method`.
///
/// Fields of the alternate shape that are missing or `null` decode as `None` instead
/// of failing, all fields of the default shape are required.
pub fn decode(body: &[u8], method: FetchMethod) -> Result<WeatherResponse, serde_json::Error> {
    match method {
        FetchMethod::Default => serde_json::from_slice(body).map(WeatherResponse::Default),
        FetchMethod::Alternate => serde_json::from_slice(body).map(WeatherResponse::Alternate),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DefaultResponse {
    #[serde(alias = "latitude")]
    pub latitude: f64,
    #[serde(alias = "longitude")]
    pub longitude: f64,
    #[serde(alias = "current_weather")]
    pub current: CurrentWeatherDefault,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentWeatherDefault {
    #[serde(alias = "temperature")]
    pub temperature: f64,
    #[serde(alias = "windspeed")]
    pub wind_speed: f64,
    #[serde(alias = "winddirection")]
    pub wind_direction: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AlternateResponse {
    #[serde(alias = "latitude")]
    pub latitude: f64,
    #[serde(alias = "longitude")]
    pub longitude: f64,
    #[serde(default, alias = "current")]
    pub current: CurrentWeatherAlternate,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CurrentWeatherAlternate {
    #[serde(default, alias = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "apparent_temperature")]
    pub apparent_temperature: Option<f64>,
    #[serde(default, alias = "relative_humidity_2m")]
    pub relative_humidity: Option<f64>,
    #[serde(default, alias = "is_day")]
    pub is_day: Option<f64>,
    #[serde(default, alias = "precipitation")]
    pub precipitation: Option<f64>,
    #[serde(default, alias = "rain")]
    pub rain: Option<f64>,
    #[serde(default, alias = "showers")]
    pub showers: Option<f64>,
    #[serde(default, alias = "snowfall")]
    pub snowfall: Option<f64>,
    #[serde(default, alias = "weather_code")]
    pub weather_code: Option<f64>,
    #[serde(default, alias = "cloud_cover")]
    pub cloud_cover: Option<f64>,
    #[serde(default, alias = "surface_pressure")]
    pub surface_pressure: Option<f64>,
    #[serde(default, alias = "pressure_msl")]
    pub pressure_msl: Option<f64>,
    #[serde(default, alias = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(default, alias = "wind_direction_10m")]
    pub wind_direction: Option<f64>,
    #[serde(default, alias = "wind_gusts_10m")]
    pub wind_gusts: Option<f64>,
}
