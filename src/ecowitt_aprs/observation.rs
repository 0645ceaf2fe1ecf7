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

const KEY_DATE_UTC: &str = "dateutc";
const KEY_WIND_DIR: &str = "winddir";
const KEY_WIND_SPEED: &str = "windspeedmph";
const KEY_WIND_GUST: &str = "windgustmph";
const KEY_MAX_DAILY_GUST: &str = "maxdailygust";
const KEY_TEMP: &str = "tempf";
const KEY_RAIN_HOURLY: &str = "hourlyrainin";
const KEY_RAIN_DAILY: &str = "dailyrainin";
const KEY_HUMIDITY: &str = "humidity";
const KEY_BAROM_REL: &str = "baromrelin";
const KEY_SOLAR_RADIATION: &str = "solarradiation";
const KEY_UV: &str = "uv";
const KEY_BATTERY: &str = "wh65batt";
const KEY_MODEL: &str = "model";

const MAX_TIMESTAMP_CHARS: usize = 29;
const MAX_MODEL_CHARS: usize = 49;

/// One decoded weather station report.
///
/// Fields that stations may legitimately report as zero but may also leave out entirely
/// are `Option`s. Every other numeric field defaults to zero when the station didn't
/// send it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub timestamp: Option<String>,
    pub wind_direction_deg: i32,
    pub wind_speed_mph: f64,
    pub wind_gust_mph: f64,
    pub max_daily_gust_mph: Option<f64>,
    pub temperature_f: f64,
    pub rain_hourly_in: f64,
    pub rain_daily_in: f64,
    pub humidity_pct: i32,
    pub pressure_inhg: f64,
    pub solar_radiation_wm2: Option<f64>,
    pub uv_index: Option<i32>,
    /// Battery status reported by WH65 outdoor sensors. There is no known mapping
    /// of this value to anything in an APRS weather packet so it isn't encoded.
    pub battery_status: Option<i32>,
    pub station_model: Option<String>,
}

impl Observation {
    /// Build an `Observation` from already percent-decoded key/value pairs.
    ///
    /// Unknown keys are ignored. Values that can't be parsed as numbers are coerced
    /// leniently: the longest numeric prefix is used, or zero if there isn't one. If
    /// a key appears more than once, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut obs = Self::default();
        for (k, v) in pairs {
            obs.set(k.as_ref(), v.as_ref());
        }

        obs
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            KEY_DATE_UTC => self.timestamp = bounded_text(value, MAX_TIMESTAMP_CHARS),
            KEY_WIND_DIR => self.wind_direction_deg = lenient_int(value),
            KEY_WIND_SPEED => self.wind_speed_mph = lenient_float(value),
            KEY_WIND_GUST => self.wind_gust_mph = lenient_float(value),
            KEY_MAX_DAILY_GUST => self.max_daily_gust_mph = Some(lenient_float(value)),
            KEY_TEMP => self.temperature_f = lenient_float(value),
            KEY_RAIN_HOURLY => self.rain_hourly_in = lenient_float(value),
            KEY_RAIN_DAILY => self.rain_daily_in = lenient_float(value),
            KEY_HUMIDITY => self.humidity_pct = lenient_int(value),
            KEY_BAROM_REL => self.pressure_inhg = lenient_float(value),
            KEY_SOLAR_RADIATION => self.solar_radiation_wm2 = Some(lenient_float(value)),
            KEY_UV => self.uv_index = Some(lenient_int(value)),
            KEY_BATTERY => self.battery_status = Some(lenient_int(value)),
            KEY_MODEL => self.station_model = bounded_text(value, MAX_MODEL_CHARS),
            _ => {
                tracing::trace!(message = "ignoring unknown report field", key = %key);
            }
        }
    }

    /// Return true if this observation has a timestamp and a pressure reading.
    ///
    /// Observations without both of these can't be usefully placed on an APRS weather
    /// map and must not be encoded. Every other field falls back to a default.
    pub fn is_valid(&self) -> bool {
        self.timestamp.as_deref().map(|t| !t.is_empty()).unwrap_or(false) && self.pressure_inhg > 0.0
    }
}

fn bounded_text(value: &str, max_chars: usize) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.chars().take(max_chars).collect())
    }
}

/// Parse the leading integer of `value` the way C `atoi` does, zero if there isn't one.
fn lenient_int(value: &str) -> i32 {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end == digits_start {
        return 0;
    }

    s[..end]
        .parse::<i64>()
        .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .unwrap_or(0)
}

/// Parse the leading decimal number of `value` the way C `atof` does, zero if there isn't one.
fn lenient_float(value: &str) -> f64 {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    // Only consume an exponent if it's complete, "1e" is just "1"
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }

        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }

        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}
