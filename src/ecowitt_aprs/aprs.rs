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

//! Encoding of observations as APRS timestamped position reports with weather data.
//!
//! Packets look like `N0CALL>APRS:@011423z4903.50N/07201.75W_c270s005g009t068r000P012L300h55b10108GW1000 GWtoAPRS`.
//! Every fixed field after the `_` symbol has a single character tag followed by a
//! fixed number of digits. APRS consumers parse these by position so each field
//! must always be exactly as wide as documented here.

use crate::config::AprsConfig;
use crate::observation::Observation;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%d+%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const INHG_TO_MILLIBAR: f64 = 33.8639;

/// Source of the current time, used when a report has an unparseable timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Encode a complete observation as an APRS weather packet.
///
/// Callers must check `Observation::is_valid()` first. An incomplete observation is
/// still encoded, without panicking, but the packet is meaningless. Values outside the
/// range an APRS field can represent are clamped where there is a sensible bound,
/// otherwise written as-is.
pub fn encode(obs: &Observation, config: &AprsConfig, clock: &dyn Clock) -> String {
    let mut packet = format!(
        "{}>{}:@{}{}/{}_",
        config.callsign,
        config.destination,
        time_field(obs.timestamp.as_deref().unwrap_or_default(), clock),
        config.latitude,
        config.longitude,
    );

    packet.push_str(&wind_direction_field(obs.wind_direction_deg));
    packet.push_str(&speed_field('s', obs.wind_speed_mph));
    packet.push_str(&speed_field('g', obs.wind_gust_mph));
    packet.push_str(&temperature_field(obs.temperature_f));
    packet.push_str(&rain_field('r', obs.rain_hourly_in));
    packet.push_str(&rain_field('P', obs.rain_daily_in));
    if let Some(solar) = obs.solar_radiation_wm2.and_then(solar_radiation_field) {
        packet.push_str(&solar);
    }
    packet.push_str(&humidity_field(obs.humidity_pct));
    packet.push_str(&pressure_field(obs.pressure_inhg));
    packet.push_str(&comment(obs, &config.software_name));

    packet
}

/// Wrap an encoded packet in the APRS-IS login line expected by HTTP submit ports.
pub fn envelope(packet: &str, config: &AprsConfig) -> String {
    format!(
        "user {} pass {} vers {} {}\n{}\n",
        config.callsign, config.passcode, config.software_name, config.software_version, packet
    )
}

/// `DDHHMMz` from the report timestamp, or from the clock if it can't be parsed.
///
/// Anything after the seconds (fractions, a zone suffix) is ignored.
fn time_field(timestamp: &str, clock: &dyn Clock) -> String {
    let parsed = TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_and_remainder(timestamp, layout).ok())
        .map(|(t, _)| t);

    let (day, hour, minute) = match parsed {
        Some(t) => (t.day(), t.hour(), t.minute()),
        None => {
            let now = clock.now();
            tracing::warn!(message = "unable to parse report timestamp, using current time", timestamp = %timestamp);
            (now.day(), now.hour(), now.minute())
        }
    };

    format!("{:02}{:02}{:02}z", day, hour, minute)
}

fn wind_direction_field(degrees: i32) -> String {
    let degrees = if (0..=360).contains(&degrees) { degrees } else { 0 };
    format!("c{:03}", degrees)
}

// No upper bound, speeds over 999 are wider than the field.
fn speed_field(tag: char, mph: f64) -> String {
    format!("{}{:03}", tag, mph.max(0.0).round() as i64)
}

fn temperature_field(fahrenheit: f64) -> String {
    let rounded = fahrenheit.round() as i64;
    match rounded {
        -99..=-1 => format!("t-{:02}", rounded.abs()),
        0..=999 => format!("t{:03}", rounded),
        _ if rounded < 0 => "t-99".to_owned(),
        _ => "t999".to_owned(),
    }
}

// Hundredths of an inch, no upper bound.
fn rain_field(tag: char, inches: f64) -> String {
    format!("{}{:03}", tag, (inches * 100.0).round() as i64)
}

/// `L###` below 1000 W/m², `l###` in tens of W/m² above. Nothing when zero or less.
fn solar_radiation_field(wm2: f64) -> Option<String> {
    if wm2 <= 0.0 {
        None
    } else if wm2 < 1000.0 {
        Some(format!("L{:03}", wm2.round() as i64))
    } else {
        Some(format!("l{:03}", (wm2 / 10.0).round() as i64))
    }
}

// APRS uses "00" for 100%
fn humidity_field(pct: i32) -> String {
    let pct = if pct == 100 || pct < 0 { 0 } else { pct % 100 };
    format!("h{:02}", pct)
}

/// Tenths of a millibar.
fn pressure_field(inhg: f64) -> String {
    format!("b{:05}", (inhg * INHG_TO_MILLIBAR * 10.0).round() as i64)
}

fn comment(obs: &Observation, software_name: &str) -> String {
    let mut tokens: Vec<String> = Vec::with_capacity(4);

    // Control characters would end the packet line early
    if let Some(model) = obs.station_model.as_deref() {
        let model: String = model.chars().filter(|c| !c.is_control()).collect();
        if !model.is_empty() {
            tokens.push(model);
        }
    }

    if let Some(gust) = obs.max_daily_gust_mph.filter(|g| *g > 0.0) {
        tokens.push(format!("MaxGust:{:.1}mph", gust));
    }

    if let Some(uv) = obs.uv_index.filter(|u| *u >= 0) {
        tokens.push(format!("UVI:{}", uv));
    }

    if !software_name.is_empty() {
        tokens.push(software_name.to_owned());
    }

    tokens.join(" ")
}

#[cfg(test)]
mod test {
    use super::{
        comment, encode, envelope, humidity_field, pressure_field, rain_field, solar_radiation_field, speed_field,
        temperature_field, time_field, wind_direction_field, FixedClock,
    };
    use crate::config::AprsConfig;
    use crate::observation::Observation;
    use chrono::{TimeZone, Utc};

    fn config() -> AprsConfig {
        AprsConfig {
            callsign: "N0CALL-13".to_owned(),
            passcode: "12345".to_owned(),
            latitude: "4903.50N".to_owned(),
            longitude: "07201.75W".to_owned(),
            destination: "APRS".to_owned(),
            server_host: "localhost".to_owned(),
            server_port: 8080,
            software_name: "GWtoAPRS".to_owned(),
            software_version: "1.0".to_owned(),
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 9, 7, 5, 42).unwrap())
    }

    fn observation() -> Observation {
        Observation {
            timestamp: Some("2024-05-01+14:23:10".to_owned()),
            pressure_inhg: 29.92,
            ..Default::default()
        }
    }

    #[test]
    fn test_time_field_plus_layout() {
        assert_eq!("011423z", time_field("2024-05-01+14:23:10", &clock()));
    }

    #[test]
    fn test_time_field_space_layout() {
        assert_eq!("310005z", time_field("2023-12-31 00:05:59", &clock()));
    }

    #[test]
    fn test_time_field_malformed() {
        assert_eq!("090705z", time_field("now", &clock()));
        assert_eq!("090705z", time_field("2024-05-01T14:23:10Z", &clock()));
        assert_eq!("090705z", time_field("", &clock()));
    }

    #[test]
    fn test_time_field_trailing_input() {
        assert_eq!("011423z", time_field("2024-05-01 14:23:10.5", &clock()));
        assert_eq!("011423z", time_field("2024-05-01+14:23:10Z", &clock()));
    }

    #[test]
    fn test_wind_direction_field() {
        assert_eq!("c000", wind_direction_field(0));
        assert_eq!("c045", wind_direction_field(45));
        assert_eq!("c360", wind_direction_field(360));
        assert_eq!("c000", wind_direction_field(361));
        assert_eq!("c000", wind_direction_field(-1));
        assert_eq!("c000", wind_direction_field(i32::MIN));
    }

    #[test]
    fn test_speed_field() {
        assert_eq!("s005", speed_field('s', 5.0));
        assert_eq!("s006", speed_field('s', 5.5));
        assert_eq!("g012", speed_field('g', 12.4));
        assert_eq!("s000", speed_field('s', -3.0));
        assert_eq!("s1200", speed_field('s', 1200.0));
    }

    #[test]
    fn test_temperature_field() {
        assert_eq!("t-06", temperature_field(-5.6));
        assert_eq!("t072", temperature_field(72.4));
        assert_eq!("t999", temperature_field(1500.0));
        assert_eq!("t-99", temperature_field(-150.0));
        assert_eq!("t-99", temperature_field(-99.0));
        assert_eq!("t-99", temperature_field(-99.6));
        assert_eq!("t000", temperature_field(-0.4));
        assert_eq!("t000", temperature_field(0.0));
        assert_eq!("t999", temperature_field(999.0));
    }

    #[test]
    fn test_rain_field() {
        assert_eq!("r000", rain_field('r', 0.0));
        assert_eq!("P012", rain_field('P', 0.12));
        assert_eq!("r125", rain_field('r', 1.254));
        assert_eq!("P1050", rain_field('P', 10.5));
    }

    #[test]
    fn test_solar_radiation_field() {
        assert_eq!(Some("L450".to_owned()), solar_radiation_field(450.0));
        assert_eq!(Some("L001".to_owned()), solar_radiation_field(0.6));
        assert_eq!(Some("L999".to_owned()), solar_radiation_field(999.0));
        assert_eq!(Some("l100".to_owned()), solar_radiation_field(1000.0));
        assert_eq!(Some("l120".to_owned()), solar_radiation_field(1200.0));
        assert_eq!(None, solar_radiation_field(0.0));
        assert_eq!(None, solar_radiation_field(-1.0));
    }

    #[test]
    fn test_humidity_field() {
        assert_eq!("h00", humidity_field(100));
        assert_eq!("h00", humidity_field(-5));
        assert_eq!("h50", humidity_field(150));
        assert_eq!("h07", humidity_field(7));
        assert_eq!("h99", humidity_field(99));
    }

    #[test]
    fn test_pressure_field() {
        assert_eq!("b10132", pressure_field(29.92));
        assert_eq!("b10108", pressure_field(29.85));
        assert_eq!("b09651", pressure_field(28.5));
    }

    #[test]
    fn test_comment_uv_no_gust() {
        let obs = Observation {
            station_model: Some("WH65".to_owned()),
            max_daily_gust_mph: Some(-1.0),
            uv_index: Some(7),
            ..observation()
        };

        assert_eq!("WH65 UVI:7 GWtoAPRS", comment(&obs, "GWtoAPRS"));
    }

    #[test]
    fn test_comment_all_tokens() {
        let obs = Observation {
            station_model: Some("GW1100".to_owned()),
            max_daily_gust_mph: Some(14.3),
            uv_index: Some(0),
            ..observation()
        };

        assert_eq!("GW1100 MaxGust:14.3mph UVI:0 GWtoAPRS", comment(&obs, "GWtoAPRS"));
    }

    #[test]
    fn test_comment_only_software() {
        let obs = Observation {
            uv_index: Some(-1),
            max_daily_gust_mph: Some(0.0),
            ..observation()
        };

        assert_eq!("GWtoAPRS", comment(&obs, "GWtoAPRS"));
        assert_eq!("", comment(&obs, ""));
    }

    #[test]
    fn test_comment_model_control_characters() {
        let obs = Observation {
            station_model: Some("GW\r\nEVIL>APRS:!fake\t".to_owned()),
            ..observation()
        };

        assert_eq!("GWEVIL>APRS:!fake GWtoAPRS", comment(&obs, "GWtoAPRS"));

        let obs = Observation {
            station_model: Some("\n\r".to_owned()),
            ..observation()
        };

        assert_eq!("GWtoAPRS", comment(&obs, "GWtoAPRS"));
    }

    #[test]
    fn test_envelope_model_cannot_add_lines() {
        let obs = Observation::from_pairs([
            ("dateutc", "2024-05-01 14:23:10"),
            ("baromrelin", "29.92"),
            ("model", "GW\nEVIL>APRS:!fake"),
        ]);

        let packet = encode(&obs, &config(), &clock());
        assert!(!packet.contains('\n'));
        assert!(!packet.contains('\r'));

        let envelope = envelope(&packet, &config());
        assert_eq!(2, envelope.lines().count());
        assert!(envelope.ends_with("b10132GWEVIL>APRS:!fake GWtoAPRS\n"));
    }

    #[test]
    fn test_encode_incomplete_does_not_panic() {
        let packet = encode(&Observation::default(), &config(), &clock());
        assert!(packet.starts_with("N0CALL-13>APRS:@090705z4903.50N/07201.75W_"));
        assert!(packet.ends_with("b00000GWtoAPRS"));
    }

    #[test]
    fn test_encode_minimal() {
        let packet = encode(&observation(), &config(), &clock());
        assert_eq!(
            "N0CALL-13>APRS:@011423z4903.50N/07201.75W_c000s000g000t000r000P000h00b10132GWtoAPRS",
            packet
        );
    }

    #[test]
    fn test_encode_full() {
        let obs = Observation {
            timestamp: Some("2024-05-01 14:23:10".to_owned()),
            wind_direction_deg: 270,
            wind_speed_mph: 5.0,
            wind_gust_mph: 9.0,
            max_daily_gust_mph: Some(12.0),
            temperature_f: 68.0,
            rain_hourly_in: 0.0,
            rain_daily_in: 0.12,
            humidity_pct: 55,
            pressure_inhg: 29.85,
            solar_radiation_wm2: Some(300.0),
            uv_index: Some(4),
            battery_status: Some(0),
            station_model: Some("GW1000".to_owned()),
        };

        assert_eq!(
            "N0CALL-13>APRS:@011423z4903.50N/07201.75W_c270s005g009t068r000P012L300h55b10108GW1000 MaxGust:12.0mph UVI:4 GWtoAPRS",
            encode(&obs, &config(), &clock())
        );
    }

    #[test]
    fn test_encode_malformed_timestamp_uses_clock() {
        let obs = Observation {
            timestamp: Some("yesterday".to_owned()),
            ..observation()
        };

        let packet = encode(&obs, &config(), &clock());
        assert!(packet.starts_with("N0CALL-13>APRS:@090705z4903.50N/07201.75W_"));
    }

    #[test]
    fn test_encode_is_repeatable() {
        let obs = Observation {
            timestamp: Some("garbage".to_owned()),
            solar_radiation_wm2: Some(1200.0),
            temperature_f: -5.6,
            ..observation()
        };

        let clock = clock();
        assert_eq!(encode(&obs, &config(), &clock), encode(&obs, &config(), &clock));
    }

    #[test]
    fn test_envelope() {
        let packet = "N0CALL-13>APRS:@011423z4903.50N/07201.75W_c000s000g000t000r000P000h00b10132GWtoAPRS";
        assert_eq!(
            format!("user N0CALL-13 pass 12345 vers GWtoAPRS 1.0\n{}\n", packet),
            envelope(packet, &config())
        );
    }
}
