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

use serde::Deserialize;
use std::collections::HashSet;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TTL_MINUTES: u64 = 10;
const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "unable to read config: {}", e),
            Self::Parse(e) => write!(f, "unable to parse config: {}", e),
            Self::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

/// Which open-meteo.com API shape to request for a location.
///
/// `Default` requests the legacy `current_weather` block (temperature and wind only).
/// `Alternate` requests the `current` block with an explicit list of variables, any
/// of which may be missing from the response.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    #[default]
    Default,
    #[serde(alias = "alt")]
    Alternate,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Alternate => write!(f, "alternate"),
        }
    }
}

/// A single location to fetch current weather conditions for.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "ttlminutes")]
    pub ttl_minutes: Option<u64>,
    #[serde(default, alias = "fetch_method")]
    pub method: FetchMethod,
}

impl Location {
    /// How long a successful fetch for this location may be reused, ten minutes
    /// when unset or zero.
    pub fn ttl(&self) -> Duration {
        let minutes = match self.ttl_minutes {
            Some(m) if m > 0 => m,
            _ => DEFAULT_TTL_MINUTES,
        };

        Duration::from_secs(minutes.saturating_mul(60))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub locations: Vec<Location>,
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
        contents.parse()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("at least one location is required".to_owned()));
        }

        let mut seen = HashSet::new();
        for loc in self.locations.iter() {
            if loc.name.trim().is_empty() {
                return Err(ConfigError::Invalid("location names must not be empty".to_owned()));
            }

            if !seen.insert(loc.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate location {}", loc.name)));
            }

            if let Some(m) = loc.ttl_minutes {
                if m > MAX_TTL_MINUTES {
                    return Err(ConfigError::Invalid(format!(
                        "ttl_minutes {} for {} must be at most {}",
                        m, loc.name, MAX_TTL_MINUTES
                    )));
                }
            }

            if !loc.latitude.is_finite() || !(-90.0..=90.0).contains(&loc.latitude) {
                return Err(ConfigError::Invalid(format!(
                    "latitude {} for {} must be between -90 and 90",
                    loc.latitude, loc.name
                )));
            }

            if !loc.longitude.is_finite() || !(-180.0..=180.0).contains(&loc.longitude) {
                return Err(ConfigError::Invalid(format!(
                    "longitude {} for {} must be between -180 and 180",
                    loc.longitude, loc.name
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigError, FetchMethod, Location};
    use std::time::Duration;

    #[test]
    fn test_config_defaults() {
        let config: Config = r#"
            [[locations]]
            name = "vienna"
            latitude = 48.2
            longitude = 16.4
        "#
        .parse()
        .unwrap();

        let loc = &config.locations[0];
        assert_eq!("vienna", loc.name);
        assert_eq!(FetchMethod::Default, loc.method);
        assert_eq!(None, loc.ttl_minutes);
        assert_eq!(Duration::from_secs(600), loc.ttl());
    }

    #[test]
    fn test_config_explicit_values() {
        let config: Config = r#"
            [[locations]]
            name = "bratislava"
            latitude = 48.15
            longitude = 17.11
            ttl_minutes = 30
            method = "alternate"

            [[locations]]
            name = "prague"
            latitude = 50.08
            longitude = 14.43
            ttlminutes = 0
            method = "alt"
        "#
        .parse()
        .unwrap();

        assert_eq!(2, config.locations.len());
        assert_eq!(FetchMethod::Alternate, config.locations[0].method);
        assert_eq!(Duration::from_secs(1800), config.locations[0].ttl());
        assert_eq!(FetchMethod::Alternate, config.locations[1].method);
        assert_eq!(Duration::from_secs(600), config.locations[1].ttl());
    }

    #[test]
    fn test_config_unknown_method() {
        let res: Result<Config, _> = r#"
            [[locations]]
            name = "vienna"
            latitude = 48.2
            longitude = 16.4
            method = "hourly"
        "#
        .parse();

        assert!(matches!(res, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_duplicate_names() {
        let res: Result<Config, _> = r#"
            [[locations]]
            name = "vienna"
            latitude = 48.2
            longitude = 16.4

            [[locations]]
            name = "vienna"
            latitude = 48.21
            longitude = 16.37
        "#
        .parse();

        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_no_locations() {
        let res: Result<Config, _> = "locations = []".parse();
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_ttl_too_large() {
        let res: Result<Config, _> = r#"
            [[locations]]
            name = "vienna"
            latitude = 48.2
            longitude = 16.4
            ttl_minutes = 200000000000000000
        "#
        .parse();

        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_ttl_upper_bound() {
        let config: Config = r#"
            [[locations]]
            name = "vienna"
            latitude = 48.2
            longitude = 16.4
            ttl_minutes = 10080
        "#
        .parse()
        .unwrap();

        assert_eq!(Duration::from_secs(10080 * 60), config.locations[0].ttl());
    }

    #[test]
    fn test_location_ttl_saturates() {
        let loc = Location {
            name: "vienna".to_owned(),
            latitude: 48.2,
            longitude: 16.4,
            ttl_minutes: Some(u64::MAX),
            method: FetchMethod::Default,
        };

        assert_eq!(Duration::from_secs(u64::MAX), loc.ttl());
    }

    #[test]
    fn test_config_latitude_out_of_range() {
        let res: Result<Config, _> = r#"
            [[locations]]
            name = "nowhere"
            latitude = 91.0
            longitude = 16.4
        "#
        .parse();

        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }
}
