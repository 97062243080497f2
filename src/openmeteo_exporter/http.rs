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

use crate::client::WeatherSource;
use crate::exporter::Exporter;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use prometheus_client::encoding::text;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::Instrument;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

/// Global state shared between all HTTP requests via Arc.
#[derive(Debug)]
pub struct RequestState<S> {
    registry: Registry,
    exporter: Exporter<S>,
}

impl<S> RequestState<S> {
    pub fn new(registry: Registry, exporter: Exporter<S>) -> Self {
        RequestState { registry, exporter }
    }
}

/// Run a collection for all locations and render the registry in the text
/// exposition format. If encoding fails, an HTTP 500 will be returned and the
/// error will be logged.
pub async fn text_metrics_handler<S>(State(state): State<Arc<RequestState<S>>>) -> Response
where
    S: WeatherSource + Send + Sync + 'static,
{
    state
        .exporter
        .collect()
        .instrument(tracing::debug_span!("openmeteo_collect"))
        .await;

    let mut buf = String::new();
    match text::encode(&mut buf, &state.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            ([(CONTENT_TYPE, TEXT_FORMAT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics to text format", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health_handler() -> &'static str {
    "OK"
}

/// Render the landing page linking to the metrics and health endpoints.
pub fn landing_page(telemetry_path: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>openmeteo exporter</title></head>
<body>
<h1>openmeteo exporter</h1>
<p>Prometheus exporter for open-meteo.com</p>
<ul>
<li><a href="{}">Metrics</a></li>
<li><a href="/health">Health</a></li>
</ul>
</body>
</html>
"#,
        telemetry_path
    ))
}

/// True if `path` can be used as the route for metrics: absolute and not one of
/// the other routes.
pub fn valid_telemetry_path(path: &str) -> bool {
    path.starts_with('/') && path != "/" && path != "/health"
}
