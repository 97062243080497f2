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

use axum::routing::get;
use axum::Router;
use clap::Parser;
use openmeteo_exporter::client::{OpenMeteoClient, DEFAULT_API_URL};
use openmeteo_exporter::config::Config;
use openmeteo_exporter::exporter::Exporter;
use openmeteo_exporter::http::{self, RequestState};
use openmeteo_exporter::metrics::ExporterMetrics;
use prometheus_client::registry::Registry;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tower_http::trace::TraceLayer;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9113);
const DEFAULT_TIMEOUT_MILLIS: u64 = 30_000;
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Export current weather conditions from open-meteo.com as Prometheus metrics
///
/// Current conditions for each location in the config file are fetched when the
/// exporter is scraped and cached per location for a configurable number of minutes.
#[derive(Debug, Parser)]
#[clap(name = "openmeteo_exporter", version = clap::crate_version!())]
struct OpenMeteoExporterApplication {
    /// Path to the TOML file with locations to fetch current weather for
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Base URL for the open-meteo.com forecast API
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", default_value = http::DEFAULT_TELEMETRY_PATH)]
    telemetry_path: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[arg(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for fetching current weather from the open-meteo.com API, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Address to bind to. By default, openmeteo_exporter will bind to public address since
    /// the purpose is to expose metrics to an external system (Prometheus or another
    /// agent for ingestion)
    #[arg(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = OpenMeteoExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    if !http::valid_telemetry_path(&opts.telemetry_path) {
        tracing::error!(message = "invalid telemetry path", path = %opts.telemetry_path);
        process::exit(1)
    }

    let config = Config::from_path(&opts.config_file).unwrap_or_else(|e| {
        tracing::error!(message = "unable to load config", path = %opts.config_file.display(), error = %e);
        process::exit(1)
    });

    tracing::info!(
        message = "loaded config",
        path = %opts.config_file.display(),
        num_locations = config.locations.len(),
    );

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let mut registry = <Registry>::default();
    let metrics = ExporterMetrics::new(&mut registry);
    let client = OpenMeteoClient::new(http_client, opts.api_url.clone());
    let exporter = Exporter::new(config.locations, client, metrics);

    let state = Arc::new(RequestState::new(registry, exporter));
    let landing = http::landing_page(&opts.telemetry_path);
    let app = Router::new()
        .route("/", get(move || async move { landing }))
        .route("/health", get(http::health_handler))
        .route(&opts.telemetry_path, get(http::text_metrics_handler::<OpenMeteoClient>))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let server = axum::Server::try_bind(&opts.bind)
        .map(|s| {
            s.serve(app.into_make_service()).with_graceful_shutdown(async {
                // Wait for either SIGTERM or SIGINT to shutdown
                tokio::select! {
                    _ = sigterm() => {}
                    _ = sigint() => {}
                }
            })
        })
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
            process::exit(1)
        });

    tracing::info!(
        message = "server started",
        address = %opts.bind,
        telemetry_path = %opts.telemetry_path,
        api_url = %opts.api_url,
    );
    server.await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
