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

//! Gateway that forwards Ecowitt weather station reports to APRS-IS
//!
//! ## Features
//!
//! `ecowitt_aprs` accepts reports from personal weather stations that support the
//! Ecowitt "customized" upload protocol (form encoded HTTP `POST`s) and re-encodes
//! them as [APRS] weather packets which are then submitted to an [APRS-IS] server
//! using its HTTP port.
//!
//! Reports must include a timestamp (`dateutc`) and relative barometric pressure
//! (`baromrelin`) to be forwarded. All other fields are optional. The following
//! fields are included in packets.
//!
//! * `winddir` - Wind direction, in degrees.
//! * `windspeedmph` - Wind speed, in miles per hour.
//! * `windgustmph` - Wind gust, in miles per hour.
//! * `tempf` - Temperature, in degrees fahrenheit.
//! * `hourlyrainin` - Rainfall in the last hour, in inches.
//! * `dailyrainin` - Rainfall today, in inches.
//! * `solarradiation` - Solar radiation, in W/m².
//! * `humidity` - Relative humidity (0-100).
//! * `maxdailygust` - Max wind gust today, in miles per hour. Sent as a comment.
//! * `uv` - UV index. Sent as a comment.
//! * `model` - Station model. Sent as a comment.
//!
//! [APRS]: http://www.aprs.org/doc/APRS101.PDF
//! [APRS-IS]: https://www.aprs-is.net/
//!
//! ## Build
//!
//! `ecowitt_aprs` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/ecowitt_aprs.git && cd ecowitt_aprs
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Configuration
//!
//! Station identity and the APRS-IS server to submit packets to are read from a file
//! of `KEY=VALUE` lines. The path to this file is given by `--config` or the `CONFIG`
//! environment variable and defaults to `default.cfg`.
//!
//! ```text
//! APRS_CALLSIGN_SSID=N0CALL-13
//! APRS_PASSCODE=12345
//! APRS_LATITUDE=4903.50N
//! APRS_LONGITUDE=07201.75W
//! APRS_DESTINATION=APRS
//! APRS_SERVER_HOST=rotate.aprs2.net
//! APRS_SERVER_PORT=8080
//! # Optional
//! APRS_SOFTWARE_NAME=GWtoAPRS
//! APRS_SOFTWARE_VERSION=1.0
//! ```
//!
//! Latitude and longitude are used as-is and must be in APRS format: degrees and
//! decimal minutes with a hemisphere suffix.
//!
//! ### Run
//!
//! ```text
//! ./ecowitt_aprs --config /etc/ecowitt_aprs.cfg --bind 0.0.0.0:1234
//! ```
//!
//! Then configure your station (e.g. using the WS View app) to upload to a
//! "customized" server in Ecowitt protocol, using the address and port of the
//! host running `ecowitt_aprs`. Any path may be used.
//!
//! ### Prometheus
//!
//! Counters for received, incomplete, sent, and failed reports are exposed at
//! `/metrics` on the same address.
//!

pub mod aprs;
pub mod client;
pub mod config;
pub mod http;
pub mod metrics;
pub mod observation;
