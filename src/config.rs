//! Application configuration.
//!
//! One [`Config`] value is built in `main` and handed (by clone or
//! reference) to every component that needs it; nothing reads ambient
//! globals. API credentials come from the environment via
//! [`ApiConfig::from_env`]; everything else has sensible defaults and a
//! builder for overrides.
//!
//! # Example
//!
//! ```rust
//! use rs_ampel::config::{Config, NetworkConfig};
//!
//! let config = Config::default()
//!     .with_network(NetworkConfig::default().with_web_port(3000));
//! assert_eq!(config.network.web_port, 3000);
//! ```

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Lamp GPIO pin assignment.
    pub gpio: GpioConfig,
    /// Web server and UDP listener addresses.
    pub network: NetworkConfig,
    /// Mode timings and poll intervals.
    pub timing: TimingConfig,
    /// Geographic settings for the data monitors.
    pub location: LocationConfig,
    /// External API endpoints and credentials.
    pub api: ApiConfig,
}

impl Config {
    /// Build a config with credentials taken from the environment.
    pub fn from_env() -> Self {
        Self { api: ApiConfig::from_env(), ..Default::default() }
    }

    /// Set the GPIO configuration.
    pub fn with_gpio(mut self, gpio: GpioConfig) -> Self {
        self.gpio = gpio;
        self
    }

    /// Set the network configuration.
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Set the timing configuration.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set the location configuration.
    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.location = location;
        self
    }

    /// Set the API configuration.
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }
}

// ============================================================================
// GPIO Config
// ============================================================================

/// GPIO pin assignment for the three lamps (BCM numbering).
#[derive(Clone, Debug)]
pub struct GpioConfig {
    /// Red lamp pin.
    pub red_pin: u8,
    /// Yellow lamp pin.
    pub yellow_pin: u8,
    /// Green lamp pin.
    pub green_pin: u8,
    /// Whether a high level turns a lamp on (the reference relay board
    /// is active-low).
    pub active_high: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self { red_pin: 22, yellow_pin: 27, green_pin: 17, active_high: false }
    }
}

impl GpioConfig {
    /// Set the three lamp pins.
    pub fn with_pins(mut self, red: u8, yellow: u8, green: u8) -> Self {
        self.red_pin = red;
        self.yellow_pin = yellow;
        self.green_pin = green;
        self
    }

    /// Set the active level.
    pub fn with_active_high(mut self, active_high: bool) -> Self {
        self.active_high = active_high;
        self
    }
}

// ============================================================================
// Network Config
// ============================================================================

/// Listen addresses for the web server and the race-light UDP feed.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Web server bind host.
    pub web_host: String,
    /// Web server port.
    pub web_port: u16,
    /// UDP listener bind host.
    pub udp_host: String,
    /// UDP listener port.
    pub udp_port: u16,
    /// Whether to allow CORS from any origin.
    pub cors_permissive: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            web_host: "0.0.0.0".into(),
            web_port: 8000,
            udp_host: "0.0.0.0".into(),
            udp_port: 9001,
            cors_permissive: true,
        }
    }
}

impl NetworkConfig {
    /// Set the web server port.
    pub fn with_web_port(mut self, port: u16) -> Self {
        self.web_port = port;
        self
    }

    /// Set the UDP listener port.
    pub fn with_udp_port(mut self, port: u16) -> Self {
        self.udp_port = port;
        self
    }

    /// Set CORS mode.
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Web server socket address.
    pub fn web_addr(&self) -> SocketAddr {
        format!("{}:{}", self.web_host, self.web_port)
            .parse()
            .unwrap_or_else(|_| ([0, 0, 0, 0], self.web_port).into())
    }

    /// UDP listener socket address.
    pub fn udp_addr(&self) -> SocketAddr {
        format!("{}:{}", self.udp_host, self.udp_port)
            .parse()
            .unwrap_or_else(|_| ([0, 0, 0, 0], self.udp_port).into())
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Mode timings, loop cadence and monitor poll intervals.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Auto mode: green phase duration.
    pub auto_green: Duration,
    /// Auto mode: yellow phase duration.
    pub auto_yellow: Duration,
    /// Auto mode: red phase duration.
    pub auto_red: Duration,
    /// Auto mode: red+yellow phase duration.
    pub auto_red_yellow: Duration,

    /// Emergency mode blink interval.
    pub emergency_blink: Duration,
    /// Party mode strobe interval.
    pub party_blink: Duration,
    /// Degraded (no data) blink interval.
    pub degraded_blink: Duration,
    /// Race countdown step spacing.
    pub racing_step: Duration,
    /// Race telemetry-follow poll interval.
    pub racing_follow: Duration,
    /// Default control loop tick when no handler overrides it.
    pub loop_tick: Duration,
    /// Startup lamp test hold per lamp.
    pub lamp_test: Duration,

    /// Train monitor poll interval.
    pub s_bahn_poll: Duration,
    /// Weather monitor poll interval.
    pub weather_poll: Duration,
    /// Space-weather monitor poll interval.
    pub space_poll: Duration,
    /// Traffic monitor poll interval.
    pub traffic_poll: Duration,
    /// Timeout for every outbound API request.
    pub api_timeout: Duration,
    /// UDP receive timeout, bounds how long shutdown can lag.
    pub udp_recv_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            auto_green: Duration::from_secs(20),
            auto_yellow: Duration::from_secs(3),
            auto_red: Duration::from_secs(20),
            auto_red_yellow: Duration::from_secs(2),

            emergency_blink: Duration::from_millis(500),
            party_blink: Duration::from_millis(80),
            degraded_blink: Duration::from_millis(500),
            racing_step: Duration::from_secs(1),
            racing_follow: Duration::from_millis(50),
            loop_tick: Duration::from_millis(200),
            lamp_test: Duration::from_millis(200),

            s_bahn_poll: Duration::from_secs(30),
            weather_poll: Duration::from_secs(900),
            space_poll: Duration::from_secs(900),
            traffic_poll: Duration::from_secs(600),
            api_timeout: Duration::from_secs(15),
            udp_recv_timeout: Duration::from_secs(1),
        }
    }
}

impl TimingConfig {
    /// Set the default control loop tick.
    pub fn with_loop_tick(mut self, tick: Duration) -> Self {
        self.loop_tick = tick;
        self
    }

    /// Set the four auto mode phase durations.
    pub fn with_auto_phases(
        mut self,
        green: Duration,
        yellow: Duration,
        red: Duration,
        red_yellow: Duration,
    ) -> Self {
        self.auto_green = green;
        self.auto_yellow = yellow;
        self.auto_red = red;
        self.auto_red_yellow = red_yellow;
        self
    }
}

// ============================================================================
// Location Config
// ============================================================================

/// A monitored driving route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrafficRoute {
    /// Route label; the route named "commute" supplies the snapshot's
    /// commute duration text.
    pub name: String,
    /// Origin address.
    pub origin: String,
    /// Destination address.
    pub destination: String,
}

/// Geographic settings for the data monitors.
#[derive(Clone, Debug)]
pub struct LocationConfig {
    /// Weather latitude.
    pub weather_lat: String,
    /// Weather longitude.
    pub weather_lon: String,
    /// EVA station number for the timetable API.
    pub s_bahn_eva: String,
    /// Terminal stations of outbound trains, which are filtered out.
    pub outbound_destinations: Vec<String>,
    /// Routes for the traffic monitor.
    pub traffic_routes: Vec<TrafficRoute>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            // Hohenbrunn
            weather_lat: "48.0667".into(),
            weather_lon: "11.7167".into(),
            // Ottobrunn
            s_bahn_eva: "8004733".into(),
            outbound_destinations: [
                "Kreuzstraße",
                "Aying",
                "Höhenkirchen-Siegertsbrunn",
                "Dürrnhaar",
                "Hohenbrunn",
                "Wächterhof",
            ]
            .map(String::from)
            .to_vec(),
            traffic_routes: vec![
                TrafficRoute {
                    name: "commute".into(),
                    origin: "Nelkenstraße 24A, 85521 Hohenbrunn, Germany".into(),
                    destination: "Landaubogen 1, 81373 München, Germany".into(),
                },
                TrafficRoute {
                    name: "center".into(),
                    origin: "Hohenbrunn, Germany".into(),
                    destination: "Marienplatz, Munich, Germany".into(),
                },
                TrafficRoute {
                    name: "north".into(),
                    origin: "Hohenbrunn, Germany".into(),
                    destination: "BMW Welt, Munich, Germany".into(),
                },
            ],
        }
    }
}

// ============================================================================
// API Config
// ============================================================================

/// External API endpoints and credentials.
///
/// A monitor whose credentials are absent never starts; its signal field
/// keeps the no-data default and the matching mode stays in its degraded
/// blink branch.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Deutsche Bahn marketplace client id (`DB_CLIENT_ID`).
    pub db_client_id: String,
    /// Deutsche Bahn marketplace API key (`DB_CLIENT_SECRET`).
    pub db_client_secret: String,
    /// OpenWeatherMap API key (`OWM_API_KEY`).
    pub owm_api_key: String,
    /// Google Maps API key (`GOOGLE_MAPS_API_KEY`).
    pub google_maps_api_key: String,

    /// Timetable plan endpoint.
    pub db_api_url: String,
    /// Current-weather endpoint template (`{lat}`, `{lon}`, `{api_key}`).
    pub weather_api_url: String,
    /// NOAA planetary Kp index endpoint (no credentials needed).
    pub space_weather_url: String,
    /// Google Directions endpoint.
    pub google_directions_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            db_client_id: String::new(),
            db_client_secret: String::new(),
            owm_api_key: String::new(),
            google_maps_api_key: String::new(),
            db_api_url:
                "https://apis.deutschebahn.com/db-api-marketplace/apis/timetables/v1/plan".into(),
            weather_api_url:
                "https://api.openweathermap.org/data/2.5/weather?lat={lat}&lon={lon}&appid={api_key}&units=metric"
                    .into(),
            space_weather_url:
                "https://services.swpc.noaa.gov/products/noaa-planetary-k-index.json".into(),
            google_directions_url: "https://maps.googleapis.com/maps/api/directions/json".into(),
        }
    }
}

impl ApiConfig {
    /// Read credentials from the environment; missing variables become
    /// empty strings, which disables the corresponding monitor.
    pub fn from_env() -> Self {
        Self {
            db_client_id: env::var("DB_CLIENT_ID").unwrap_or_default(),
            db_client_secret: env::var("DB_CLIENT_SECRET").unwrap_or_default(),
            owm_api_key: env::var("OWM_API_KEY").unwrap_or_default(),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Set the Deutsche Bahn credentials.
    pub fn with_db_credentials(mut self, client_id: &str, secret: &str) -> Self {
        self.db_client_id = client_id.into();
        self.db_client_secret = secret.into();
        self
    }

    /// Set the OpenWeatherMap key.
    pub fn with_owm_key(mut self, key: &str) -> Self {
        self.owm_api_key = key.into();
        self
    }

    /// Set the Google Maps key.
    pub fn with_google_maps_key(mut self, key: &str) -> Self {
        self.google_maps_api_key = key.into();
        self
    }

    /// Whether the train monitor has its credential pair.
    pub fn s_bahn_enabled(&self) -> bool {
        !self.db_client_id.is_empty() && !self.db_client_secret.is_empty()
    }

    /// Whether the weather monitor has its key.
    pub fn weather_enabled(&self) -> bool {
        !self.owm_api_key.is_empty()
    }

    /// Whether the traffic monitor has its key.
    pub fn traffic_enabled(&self) -> bool {
        !self.google_maps_api_key.is_empty()
    }

    /// Weather endpoint with the location and key substituted in.
    pub fn weather_url(&self, lat: &str, lon: &str) -> String {
        self.weather_api_url
            .replace("{lat}", lat)
            .replace("{lon}", lon)
            .replace("{api_key}", &self.owm_api_key)
    }
}

// ============================================================================
// Tests
// ============================================================================
