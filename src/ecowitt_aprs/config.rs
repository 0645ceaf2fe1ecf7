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

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::path::Path;

const KEY_CALLSIGN: &str = "APRS_CALLSIGN_SSID";
const KEY_PASSCODE: &str = "APRS_PASSCODE";
const KEY_LATITUDE: &str = "APRS_LATITUDE";
const KEY_LONGITUDE: &str = "APRS_LONGITUDE";
const KEY_DESTINATION: &str = "APRS_DESTINATION";
const KEY_SERVER_HOST: &str = "APRS_SERVER_HOST";
const KEY_SERVER_PORT: &str = "APRS_SERVER_PORT";
const KEY_SOFTWARE_NAME: &str = "APRS_SOFTWARE_NAME";
const KEY_SOFTWARE_VERSION: &str = "APRS_SOFTWARE_VERSION";

pub const DEFAULT_SOFTWARE_NAME: &str = "GWtoAPRS";
pub const DEFAULT_SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub enum ConfigError {
    Load(dotenvy::Error),
    Missing(&'static str),
    InvalidPort(String),
    InvalidPosition(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "{}", e),
            Self::Missing(k) => write!(f, "missing required setting {}", k),
            Self::InvalidPort(p) => write!(f, "invalid port {}", p),
            Self::InvalidPosition(k, v) => write!(f, "invalid position {} for {}", v, k),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            _ => None,
        }
    }
}

/// Station identity and APRS-IS relay settings.
///
/// Latitude and longitude are used verbatim in each packet and must already be in
/// the APRS uncompressed format, e.g. `4903.50N` and `07201.75W`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AprsConfig {
    pub callsign: String,
    pub passcode: String,
    pub latitude: String,
    pub longitude: String,
    pub destination: String,
    pub server_host: String,
    pub server_port: u16,
    pub software_name: String,
    pub software_version: String,
}

impl AprsConfig {
    /// Load settings from a file of `KEY=VALUE` lines.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let pairs = dotenvy::from_path_iter(path)
            .map_err(ConfigError::Load)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(ConfigError::Load)?;

        Self::from_pairs(pairs)
    }

    /// Build settings from `KEY=VALUE` pairs, ignoring unknown keys.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings: HashMap<String, String> = pairs.into_iter().collect();
        let mut required = |key: &'static str| -> Result<String, ConfigError> {
            settings
                .remove(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_owned())
                .ok_or(ConfigError::Missing(key))
        };

        let callsign = required(KEY_CALLSIGN)?;
        let passcode = required(KEY_PASSCODE)?;
        let latitude = required(KEY_LATITUDE)?;
        let longitude = required(KEY_LONGITUDE)?;
        let destination = required(KEY_DESTINATION)?;
        let server_host = required(KEY_SERVER_HOST)?;
        let server_port = parse_port(required(KEY_SERVER_PORT)?)?;
        let software_name = required(KEY_SOFTWARE_NAME).unwrap_or_else(|_| DEFAULT_SOFTWARE_NAME.to_owned());
        let software_version = required(KEY_SOFTWARE_VERSION).unwrap_or_else(|_| DEFAULT_SOFTWARE_VERSION.to_owned());

        if !is_position(&latitude, 8, &['N', 'S']) {
            return Err(ConfigError::InvalidPosition(KEY_LATITUDE, latitude));
        }

        if !is_position(&longitude, 9, &['E', 'W']) {
            return Err(ConfigError::InvalidPosition(KEY_LONGITUDE, longitude));
        }

        Ok(AprsConfig {
            callsign,
            passcode,
            latitude,
            longitude,
            destination,
            server_host,
            server_port,
            software_name,
            software_version,
        })
    }
}

fn parse_port(raw: String) -> Result<u16, ConfigError> {
    match raw.parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ConfigError::InvalidPort(raw)),
    }
}

/// Uncompressed APRS positions are fixed width with a hemisphere suffix.
fn is_position(value: &str, width: usize, hemispheres: &[char]) -> bool {
    value.is_ascii() && value.len() == width && value.ends_with(hemispheres)
}
