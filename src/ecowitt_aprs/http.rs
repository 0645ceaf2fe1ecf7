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

use crate::aprs::{self, Clock};
use crate::client::AprsIsClient;
use crate::config::AprsConfig;
use crate::metrics::GatewayMetrics;
use crate::observation::Observation;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const TEXT_CONTENT_TYPE: &str = "text/plain";
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const METRICS_PREFIX: &str = "ecowitt_aprs";

/// Everything a request needs to decode, encode, and forward a report.
pub struct RequestContext {
    config: AprsConfig,
    client: AprsIsClient,
    clock: Box<dyn Clock>,
    registry: Registry,
    metrics: GatewayMetrics,
}

impl RequestContext {
    pub fn new(config: AprsConfig, client: AprsIsClient, clock: Box<dyn Clock>) -> Self {
        let mut registry = Registry::with_prefix(METRICS_PREFIX);
        let metrics = GatewayMetrics::new(&mut registry);

        RequestContext {
            config,
            client,
            clock,
            registry,
            metrics,
        }
    }
}

/// Build the router that accepts station reports on any path.
pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .fallback(http_route)
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn http_route(
    State(context): State<Arc<RequestContext>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match (&method, uri.path()) {
        (&Method::GET, "/metrics") => text_metrics(&context),
        (&Method::POST, _) if is_form(&headers) => {
            forward_report(&context, &body).await;
            text_response(StatusCode::OK, "Data received.\n")
        }
        (&Method::POST, _) => text_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type\n"),
        (_, "/") => text_response(StatusCode::OK, "GET request to /. POST weather data here.\n"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found\n"),
    }
}

/// Decode, validate, encode, and deliver a single report. Failures are logged, never returned.
async fn forward_report(context: &RequestContext, body: &[u8]) {
    context.metrics.received();

    let obs = Observation::from_pairs(parse_form(body));
    tracing::debug!(message = "decoded station report", observation = ?obs);

    if !obs.is_valid() {
        context.metrics.incomplete();
        tracing::info!(
            message = "incomplete weather data, not sending to APRS-IS",
            timestamp = ?obs.timestamp,
            pressure = obs.pressure_inhg,
        );
        return;
    }

    let packet = aprs::encode(&obs, &context.config, context.clock.as_ref());
    let envelope = aprs::envelope(&packet, &context.config);
    tracing::debug!(message = "prepared APRS-IS submission", envelope = %envelope);

    match context.client.send(envelope).await {
        Ok(_) => {
            context.metrics.sent();
            tracing::info!(message = "sent packet to APRS-IS", url = %context.client.url(), packet = %packet);
        }
        Err(e) => {
            context.metrics.failed();
            tracing::error!(message = "failed to send packet to APRS-IS", url = %context.client.url(), error = %e);
        }
    }
}

fn text_metrics(context: &RequestContext) -> Response {
    let mut buf = String::new();
    match encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            ([(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
}

/// True if the request body is form encoded, ignoring any parameters like `charset`.
fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Split a form encoded body into decoded key/value pairs, in order.
fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    body.split(|b| *b == b'&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, |b| *b == b'=');
            let key = decode_component(parts.next().unwrap_or_default());
            let value = decode_component(parts.next().unwrap_or_default());
            (key, value)
        })
        .collect()
}

fn decode_component(raw: &[u8]) -> String {
    let spaced: Vec<u8> = raw.iter().map(|b| if *b == b'+' { b' ' } else { *b }).collect();
    percent_decode(&spaced).decode_utf8_lossy().into_owned()
}
