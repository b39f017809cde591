//! Typed fields written by the background data producers.
//!
//! Each field is owned by exactly one producer and read by exactly one mode
//! handler. "No data" is explicit: `Option::None` (or `-1` for the train
//! minutes, which keeps the wire shape of the status snapshot), never an
//! error that could reach the control loop.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Current-weather report for the biergarten mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Temperature in °C.
    #[serde(rename = "temp")]
    pub temp_c: f32,
    /// Condition group, e.g. "Clear", "Clouds", "Rain", "Snow".
    pub condition: String,
}

/// Planetary Kp index report for the space mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceWeatherReport {
    /// Planetary Kp index (0-9).
    pub kp_index: i32,
    /// Derived label: Quiet, Active or Storm.
    pub condition: String,
}

/// Commute traffic report for the stau mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    /// Average delay across the configured routes, in percent over the
    /// free-flow duration.
    #[serde(rename = "avg_delay")]
    pub avg_delay_pct: f32,
    /// Display text for the commute route's current duration.
    pub commute_time: String,
}

/// All producer-owned fields, one slot per producer.
#[derive(Clone, Debug, PartialEq)]
pub struct Signals {
    /// Minutes until the next inbound train; `-1` means no data.
    pub s_bahn_minutes: i32,
    /// Latest weather report, if the weather monitor has data.
    pub weather: Option<WeatherReport>,
    /// Latest race light from the UDP feed; `Off` until a datagram arrives
    /// (the feed's "black" maps to off).
    pub race_light: Color,
    /// Latest Kp report, if the space-weather monitor has data.
    pub space_weather: Option<SpaceWeatherReport>,
    /// Latest traffic report, if the traffic monitor has data.
    pub traffic: Option<TrafficReport>,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            s_bahn_minutes: -1,
            weather: None,
            race_light: Color::Off,
            space_weather: None,
            traffic: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_no_data() {
        let signals = Signals::default();
        assert_eq!(signals.s_bahn_minutes, -1);
        assert!(signals.weather.is_none());
        assert_eq!(signals.race_light, Color::Off);
        assert!(signals.space_weather.is_none());
        assert!(signals.traffic.is_none());
    }

    #[test]
    fn weather_report_wire_shape() {
        let report = WeatherReport { temp_c: 21.5, condition: "Clear".into() };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["temp"], 21.5);
        assert_eq!(json["condition"], "Clear");
    }

    #[test]
    fn traffic_report_wire_shape() {
        let report = TrafficReport { avg_delay_pct: 33.0, commute_time: "24 mins".into() };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["avg_delay"], 33.0);
        assert_eq!(json["commute_time"], "24 mins");
    }
}
