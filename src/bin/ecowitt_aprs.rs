// ecowitt_aprs - Ecowitt weather station to APRS-IS gateway
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

use clap::Parser;
use ecowitt_aprs::aprs::SystemClock;
use ecowitt_aprs::client::AprsIsClient;
use ecowitt_aprs::config::AprsConfig;
use ecowitt_aprs::http::RequestContext;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 1234);
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_CONFIG_PATH: &str = "default.cfg";

#[derive(Debug, Parser)]
#[clap(name = "ecowitt_aprs", version = clap::crate_version!())]
struct EcowittAprsApplication {
    /// Path to a file of KEY=VALUE settings for the station callsign, position, and
    /// the APRS-IS server to send packets to
    #[clap(long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for sending packets to the APRS-IS server, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Address to bind to. By default, ecowitt_aprs will bind to public address since
    /// the purpose is to accept reports from weather stations on the local network.
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = EcowittAprsApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let config = AprsConfig::from_path(&opts.config).unwrap_or_else(|e| {
        tracing::error!(message = "unable to load configuration", path = %opts.config.display(), error = %e);
        process::exit(1)
    });

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = AprsIsClient::new(http_client, &config.server_host, config.server_port).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize APRS-IS client", error = %e);
        process::exit(1)
    });

    tracing::info!(
        message = "gateway configured",
        callsign = %config.callsign,
        latitude = %config.latitude,
        longitude = %config.longitude,
        aprs_is = %client.url(),
    );

    let context = Arc::new(RequestContext::new(config, client, Box::new(SystemClock)));
    let app = ecowitt_aprs::http::router(context);
    let server = axum::Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
        process::exit(1)
    });

    tracing::info!(message = "server started", address = %opts.bind);
    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

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
