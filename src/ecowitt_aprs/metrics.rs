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

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Counters for each stage of forwarding a report.
///
/// All metrics are created and registered upon call to `GatewayMetrics::new()`. Metric
/// names are prefixed by whatever prefix the `Registry` was created with.
#[derive(Debug, Clone, Default)]
pub struct GatewayMetrics {
    reports_received: Counter,
    reports_incomplete: Counter,
    packets_sent: Counter,
    send_failures: Counter,
}

impl GatewayMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let metrics = Self::default();

        reg.register(
            "reports_received",
            "Weather station reports received",
            metrics.reports_received.clone(),
        );
        reg.register(
            "reports_incomplete",
            "Reports missing a timestamp or pressure that were not forwarded",
            metrics.reports_incomplete.clone(),
        );
        reg.register(
            "packets_sent",
            "APRS packets accepted by the APRS-IS server",
            metrics.packets_sent.clone(),
        );
        reg.register(
            "send_failures",
            "APRS packets that could not be delivered to the APRS-IS server",
            metrics.send_failures.clone(),
        );

        metrics
    }

    pub fn received(&self) {
        self.reports_received.inc();
    }

    pub fn incomplete(&self) {
        self.reports_incomplete.inc();
    }

    pub fn sent(&self) {
        self.packets_sent.inc();
    }

    pub fn failed(&self) {
        self.send_failures.inc();
    }
}
