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

use crate::config::{FetchMethod, Location};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::error;
use std::fmt;
use std::future::Future;

pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

const ALTERNATE_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,is_day,precipitation,\
rain,showers,snowfall,weather_code,cloud_cover,pressure_msl,surface_pressure,wind_speed_10m,wind_direction_10m,\
wind_gusts_10m";

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    Rejected(StatusCode, String),
    Unexpected(StatusCode, Url),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::Rejected(status, reason) => write!(f, "request rejected with status {}: {}", status, reason),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Source of raw current-conditions documents for a location.
///
/// Implementations return the unparsed response body so that callers can account
/// for the number of bytes received before decoding it.
pub trait WeatherSource {
    fn fetch(&self, location: &Location) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

/// Build the forecast API URL for the current conditions of a location.
///
/// Coordinates are rounded to two decimal places, the same resolution the API
/// snaps to anyway.
pub fn request_url(base_url: &Url, location: &Location) -> Url {
    let current = match location.method {
        FetchMethod::Default => "current_weather=true".to_owned(),
        FetchMethod::Alternate => format!("current={}", ALTERNATE_FIELDS),
    };

    let mut url = base_url.clone();
    url.set_query(Some(&format!(
        "latitude={:.2}&longitude={:.2}&{}",
        location.latitude, location.longitude, current
    )));

    url
}

/// Error document returned by the API for invalid requests.
#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(alias = "reason")]
    reason: String,
}

#[derive(Debug)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: Url,
}

impl OpenMeteoClient {
    const USER_AGENT: &'static str = "openmeteo_exporter (Prometheus exporter for open-meteo.com)";
    const JSON_CONTENT: &'static str = "application/json";

    pub fn new(client: Client, base_url: Url) -> Self {
        OpenMeteoClient { client, base_url }
    }

    async fn make_request(&self, url: Url) -> Result<Vec<u8>, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_CONTENT)
            .header(CONTENT_TYPE, Self::JSON_CONTENT)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        let body = res.bytes().await.map_err(ClientError::Internal)?;

        if status == StatusCode::OK {
            Ok(body.to_vec())
        } else if let Ok(e) = serde_json::from_slice::<ApiError>(&body) {
            Err(ClientError::Rejected(status, e.reason))
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }
}

impl WeatherSource for OpenMeteoClient {
    fn fetch(&self, location: &Location) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send {
        let url = request_url(&self.base_url, location);
        tracing::debug!(message = "making current weather request", url = %url);
        self.make_request(url)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::{request_url, ClientError, OpenMeteoClient, WeatherSource, DEFAULT_API_URL};
    use crate::config::{FetchMethod, Location};
    use axum::extract::{RawQuery, State};
    use axum::http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
    use axum::http::HeaderMap;
    use axum::response::{Html, IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use reqwest::{Client, StatusCode, Url};
    use std::collections::HashMap;
    use std::future::Future;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const STUB_BODY: &str =
        r#"{"latitude":48.2,"longitude":16.4,"current_weather":{"temperature":-0.1,"windspeed":5.9,"winddirection":137}}"#;

    pub(crate) fn location(name: &str, method: FetchMethod) -> Location {
        Location {
            name: name.to_owned(),
            latitude: 48.2,
            longitude: 16.4,
            ttl_minutes: None,
            method,
        }
    }

    /// WeatherSource implementation that returns canned bodies per location name and
    /// fails for any location without one.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSource {
        bodies: Mutex<HashMap<String, Vec<u8>>>,
        requests: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn set_body(&self, name: &str, body: &[u8]) {
            self.bodies.lock().unwrap().insert(name.to_owned(), body.to_vec());
        }

        pub(crate) fn remove_body(&self, name: &str) {
            self.bodies.lock().unwrap().remove(name);
        }

        pub(crate) fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl WeatherSource for FakeSource {
        fn fetch(&self, location: &Location) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let res = self.bodies.lock().unwrap().get(&location.name).cloned().ok_or_else(|| {
                ClientError::Unexpected(
                    StatusCode::SERVICE_UNAVAILABLE,
                    request_url(&Url::parse(DEFAULT_API_URL).unwrap(), location),
                )
            });

            async move { res }
        }
    }

    #[test]
    fn test_request_url_default() {
        let base = Url::parse(DEFAULT_API_URL).unwrap();
        let url = request_url(&base, &location("vienna", FetchMethod::Default));

        assert_eq!(
            "https://api.open-meteo.com/v1/forecast?latitude=48.20&longitude=16.40&current_weather=true",
            url.as_str()
        );
    }

    #[test]
    fn test_request_url_alternate() {
        let base = Url::parse(DEFAULT_API_URL).unwrap();
        let url = request_url(&base, &location("vienna", FetchMethod::Alternate));

        assert_eq!(
            "https://api.open-meteo.com/v1/forecast?latitude=48.20&longitude=16.40&current=temperature_2m,\
            relative_humidity_2m,apparent_temperature,is_day,precipitation,rain,showers,snowfall,weather_code,\
            cloud_cover,pressure_msl,surface_pressure,wind_speed_10m,wind_direction_10m,wind_gusts_10m",
            url.as_str()
        );
    }

    #[test]
    fn test_request_url_rounding() {
        let base = Url::parse("http://localhost:8080/v1/forecast").unwrap();
        let mut loc = location("sydney", FetchMethod::Default);
        loc.latitude = -33.8688;
        loc.longitude = 151.2093;

        let url = request_url(&base, &loc);
        assert_eq!(
            "http://localhost:8080/v1/forecast?latitude=-33.87&longitude=151.21&current_weather=true",
            url.as_str()
        );
    }

    #[test]
    fn test_request_url_replaces_existing_query() {
        let base = Url::parse("https://api.open-meteo.com/v1/forecast?timezone=UTC").unwrap();
        let url = request_url(&base, &location("vienna", FetchMethod::Default));

        assert_eq!(Some("latitude=48.20&longitude=16.40&current_weather=true"), url.query());
    }

    /// Requests seen by the stub forecast API: query string, accept and content-type.
    type Seen = Arc<Mutex<Vec<(String, String, String)>>>;

    async fn stub_forecast(State(seen): State<Seen>, RawQuery(query): RawQuery, headers: HeaderMap) -> Response {
        let query = query.unwrap_or_default();
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        };
        seen.lock()
            .unwrap()
            .push((query.clone(), header(ACCEPT), header(CONTENT_TYPE)));

        if query.starts_with("latitude=10.00&") {
            (
                StatusCode::BAD_REQUEST,
                r#"{"error":true,"reason":"Latitude must be in range"}"#,
            )
                .into_response()
        } else if query.starts_with("latitude=20.00&") {
            (StatusCode::BAD_GATEWAY, Html("<html><body>bad gateway</body></html>")).into_response()
        } else {
            STUB_BODY.into_response()
        }
    }

    fn stub_server() -> (Url, Seen) {
        let seen = Seen::default();
        let app = Router::new()
            .route("/v1/forecast", get(stub_forecast))
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
        tokio::spawn(server);

        (Url::parse(&format!("http://{}/v1/forecast", addr)).unwrap(), seen)
    }

    #[tokio::test]
    async fn test_client_fetch_success() {
        let (base, seen) = stub_server();
        let client = OpenMeteoClient::new(Client::new(), base.clone());
        let loc = location("vienna", FetchMethod::Alternate);

        let body = client.fetch(&loc).await.unwrap();
        assert_eq!(STUB_BODY.as_bytes(), body.as_slice());

        let seen = seen.lock().unwrap();
        assert_eq!(1, seen.len());
        assert_eq!(request_url(&base, &loc).query().unwrap(), seen[0].0);
        assert_eq!("application/json", seen[0].1);
        assert_eq!("application/json", seen[0].2);
    }

    #[tokio::test]
    async fn test_client_fetch_rejected() {
        let (base, _seen) = stub_server();
        let client = OpenMeteoClient::new(Client::new(), base);
        let mut loc = location("nowhere", FetchMethod::Default);
        loc.latitude = 10.0;

        match client.fetch(&loc).await {
            Err(ClientError::Rejected(status, reason)) => {
                assert_eq!(StatusCode::BAD_REQUEST, status);
                assert_eq!("Latitude must be in range", reason);
            }
            other => panic!("expected rejected request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_fetch_unexpected() {
        let (base, _seen) = stub_server();
        let client = OpenMeteoClient::new(Client::new(), base.clone());
        let mut loc = location("gateway", FetchMethod::Default);
        loc.latitude = 20.0;

        match client.fetch(&loc).await {
            Err(ClientError::Unexpected(status, url)) => {
                assert_eq!(StatusCode::BAD_GATEWAY, status);
                assert_eq!(request_url(&base, &loc), url);
            }
            other => panic!("expected unexpected status, got {:?}", other),
        }
    }
}
