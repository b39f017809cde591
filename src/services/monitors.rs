//! Data producer tasks.
//!
//! Four pollers, each owning exactly one signal field: train minutes,
//! weather, space weather and traffic. A poller whose credentials are
//! missing logs once and never starts, leaving its field at the no-data
//! default so the matching mode stays in its degraded blink branch.
//!
//! Every fetch applies the configured request timeout and collapses any
//! failure (transport, HTTP status, malformed payload) into "no data";
//! producers never crash the system over a bad upstream.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::parsing;
use crate::signals::{SpaceWeatherReport, TrafficReport, WeatherReport};
use crate::traits::LightOutput;

use super::shared::SharedLightState;

fn api_client(config: &Config) -> Option<Client> {
    match Client::builder().timeout(config.timing.api_timeout).build() {
        Ok(client) => Some(client),
        Err(e) => {
            error!(error = %e, "failed to build HTTP client; monitor not starting");
            None
        }
    }
}

// ============================================================================
// Train departures
// ============================================================================

/// Poll the timetable API and publish minutes until the next inbound
/// train.
pub async fn s_bahn_monitor<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    if !config.api.s_bahn_enabled() {
        warn!("train monitor disabled: DB credentials not set");
        return;
    }
    let Some(client) = api_client(&config) else { return };
    info!("train monitor running");

    while state.is_running() {
        let minutes = fetch_train_minutes(&client, &config).await;
        debug!(?minutes, "train poll");
        state.with_controller(|c| c.set_train_minutes(minutes));
        tokio::time::sleep(config.timing.s_bahn_poll).await;
    }
}

/// Fetch the current and the next hour's timetable pages and take the
/// nearest inbound departure across both.
async fn fetch_train_minutes(client: &Client, config: &Config) -> Option<u32> {
    let now = chrono::Local::now().naive_local();
    let mut pages = Vec::new();
    for hour_offset in 0..2 {
        let slot = now + chrono::Duration::hours(hour_offset);
        let url = format!(
            "{}/{}/{}/{}",
            config.api.db_api_url,
            config.location.s_bahn_eva,
            slot.format("%y%m%d"),
            slot.format("%H"),
        );
        let body = client
            .get(&url)
            .header("DB-Client-Id", &config.api.db_client_id)
            .header("DB-Api-Key", &config.api.db_client_secret)
            .header("accept", "application/xml")
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .text()
            .await
            .ok()?;
        if !body.is_empty() {
            pages.push(body);
        }
    }
    pages
        .iter()
        .filter_map(|xml| {
            parsing::next_departure_minutes(xml, now, &config.location.outbound_destinations)
        })
        .min()
}

// ============================================================================
// Weather
// ============================================================================

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
}

/// Poll the current-weather API and publish temperature plus condition.
pub async fn weather_monitor<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    if !config.api.weather_enabled() {
        warn!("weather monitor disabled: OWM_API_KEY not set");
        return;
    }
    let Some(client) = api_client(&config) else { return };
    info!("weather monitor running");

    while state.is_running() {
        let report = fetch_weather(&client, &config).await;
        debug!(?report, "weather poll");
        state.with_controller(|c| c.set_weather(report));
        tokio::time::sleep(config.timing.weather_poll).await;
    }
}

async fn fetch_weather(client: &Client, config: &Config) -> Option<WeatherReport> {
    let url = config.api.weather_url(&config.location.weather_lat, &config.location.weather_lon);
    let body =
        client.get(&url).send().await.ok()?.error_for_status().ok()?.text().await.ok()?;
    parse_weather(&body)
}

fn parse_weather(body: &str) -> Option<WeatherReport> {
    let parsed: OwmResponse = serde_json::from_str(body).ok()?;
    let condition = parsed.weather.first()?.main.clone();
    if condition.is_empty() {
        return None;
    }
    Some(WeatherReport { temp_c: parsed.main.temp, condition })
}

// ============================================================================
// Space weather
// ============================================================================

/// Poll the NOAA planetary Kp index. Needs no credentials, so it always
/// runs.
pub async fn space_weather_monitor<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    let Some(client) = api_client(&config) else { return };
    info!("space weather monitor running");

    while state.is_running() {
        let report = fetch_space_weather(&client, &config).await;
        debug!(?report, "space weather poll");
        state.with_controller(|c| c.set_space_weather(report));
        tokio::time::sleep(config.timing.space_poll).await;
    }
}

async fn fetch_space_weather(client: &Client, config: &Config) -> Option<SpaceWeatherReport> {
    let body = client
        .get(&config.api.space_weather_url)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?
        .text()
        .await
        .ok()?;
    parse_space_weather(&body)
}

/// The feed is a JSON array of rows, header first, newest last; the Kp
/// value sits in column 1 as a decimal string.
fn parse_space_weather(body: &str) -> Option<SpaceWeatherReport> {
    let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(body).ok()?;
    let cell = rows.last()?.get(1)?;
    let kp = cell
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| cell.as_f64())? as i32;
    let condition = match kp {
        k if k >= 5 => "Storm",
        4 => "Active",
        _ => "Quiet",
    };
    Some(SpaceWeatherReport { kp_index: kp, condition: condition.to_string() })
}

// ============================================================================
// Traffic
// ============================================================================

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    duration: LegDuration,
    duration_in_traffic: Option<LegDuration>,
}

#[derive(Debug, Deserialize)]
struct LegDuration {
    value: f64,
    text: String,
}

struct RouteTiming {
    delay_pct: f64,
    traffic_text: String,
}

/// Poll the directions API over all configured routes and publish the
/// average traffic delay.
pub async fn traffic_monitor<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    if !config.api.traffic_enabled() {
        warn!("traffic monitor disabled: GOOGLE_MAPS_API_KEY not set");
        return;
    }
    let Some(client) = api_client(&config) else { return };
    info!("traffic monitor running");

    while state.is_running() {
        let report = fetch_traffic(&client, &config).await;
        debug!(?report, "traffic poll");
        state.with_controller(|c| c.set_traffic(report));
        tokio::time::sleep(config.timing.traffic_poll).await;
    }
}

/// One route failing only shrinks the average; all routes failing means
/// no data.
async fn fetch_traffic(client: &Client, config: &Config) -> Option<TrafficReport> {
    let mut delays = Vec::new();
    let mut commute_time = String::from("N/A");

    for route in &config.location.traffic_routes {
        let response = client
            .get(&config.api.google_directions_url)
            .query(&[
                ("origin", route.origin.as_str()),
                ("destination", route.destination.as_str()),
                ("key", config.api.google_maps_api_key.as_str()),
                ("departure_time", "now"),
            ])
            .send()
            .await
            .ok()
            .and_then(|r| r.error_for_status().ok());
        let Some(response) = response else { continue };
        let Ok(body) = response.text().await else { continue };
        let Some(timing) = parse_route_timing(&body) else { continue };

        delays.push(timing.delay_pct);
        if route.name == "commute" {
            commute_time = timing.traffic_text;
        }
    }

    if delays.is_empty() {
        return None;
    }
    let avg = delays.iter().sum::<f64>() / delays.len() as f64;
    Some(TrafficReport { avg_delay_pct: avg as f32, commute_time })
}

fn parse_route_timing(body: &str) -> Option<RouteTiming> {
    let parsed: DirectionsResponse = serde_json::from_str(body).ok()?;
    if parsed.status != "OK" {
        return None;
    }
    let leg = parsed.routes.first()?.legs.first()?;
    if leg.duration.value <= 0.0 {
        return None;
    }
    let in_traffic = leg.duration_in_traffic.as_ref().unwrap_or(&leg.duration);
    Some(RouteTiming {
        delay_pct: (in_traffic.value - leg.duration.value) / leg.duration.value * 100.0,
        traffic_text: in_traffic.text.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_payload() {
        let body = r#"{
            "weather": [{"id": 500, "main": "Rain", "description": "light rain"}],
            "main": {"temp": 12.3, "humidity": 80},
            "name": "Hohenbrunn"
        }"#;
        let report = parse_weather(body).unwrap();
        assert_eq!(report.condition, "Rain");
        assert!((report.temp_c - 12.3).abs() < f32::EPSILON);
    }

    #[test]
    fn weather_payload_rejects_empty_or_malformed() {
        assert!(parse_weather("{}").is_none());
        assert!(parse_weather("not json").is_none());
        assert!(parse_weather(r#"{"weather": [], "main": {"temp": 12.0}}"#).is_none());
    }

    #[test]
    fn space_weather_payload_takes_latest_row() {
        let body = r#"[
            ["time_tag", "Kp", "a_running", "station_count"],
            ["2026-08-25 00:00:00", "2.33", "8", "8"],
            ["2026-08-25 03:00:00", "5.67", "56", "8"]
        ]"#;
        let report = parse_space_weather(body).unwrap();
        assert_eq!(report.kp_index, 5);
        assert_eq!(report.condition, "Storm");
    }

    #[test]
    fn space_weather_conditions() {
        let row = |kp: &str| {
            format!(r#"[["time_tag","Kp"],["2026-08-25 00:00:00","{kp}","1","8"]]"#)
        };
        assert_eq!(parse_space_weather(&row("4.0")).unwrap().condition, "Active");
        assert_eq!(parse_space_weather(&row("1.67")).unwrap().condition, "Quiet");
    }

    #[test]
    fn space_weather_header_only_means_no_data() {
        assert!(parse_space_weather(r#"[["time_tag", "Kp"]]"#).is_none());
        assert!(parse_space_weather("[]").is_none());
        assert!(parse_space_weather("{}").is_none());
    }

    #[test]
    fn route_timing_uses_traffic_duration_when_present() {
        let body = r#"{
            "status": "OK",
            "routes": [{"legs": [{
                "duration": {"value": 1000, "text": "17 mins"},
                "duration_in_traffic": {"value": 1500, "text": "25 mins"}
            }]}]
        }"#;
        let timing = parse_route_timing(body).unwrap();
        assert!((timing.delay_pct - 50.0).abs() < 1e-9);
        assert_eq!(timing.traffic_text, "25 mins");
    }

    #[test]
    fn route_timing_falls_back_to_base_duration() {
        let body = r#"{
            "status": "OK",
            "routes": [{"legs": [{"duration": {"value": 1200, "text": "20 mins"}}]}]
        }"#;
        let timing = parse_route_timing(body).unwrap();
        assert_eq!(timing.delay_pct, 0.0);
        assert_eq!(timing.traffic_text, "20 mins");
    }

    #[test]
    fn route_timing_rejects_error_status() {
        assert!(parse_route_timing(r#"{"status": "REQUEST_DENIED"}"#).is_none());
        assert!(parse_route_timing(r#"{"status": "OK", "routes": []}"#).is_none());
    }
}
