//! # rs-ampel
//!
//! A three-lamp traffic light controller with mode arbitration, built for
//! a relay-driven signal on a Raspberry Pi but fully testable on a
//! desktop.
//!
//! ## Features
//!
//! - **Hardware abstraction**: one [`traits::LightOutput`] trait with GPIO,
//!   simulated and mock implementations
//! - **Eleven modes**: the regular cycle plus party, emergency, SOS,
//!   train departures, beer-garden weather, race telemetry, space weather,
//!   traffic and manual override, with toggle-off semantics
//! - **Data producers**: pollers for train, weather, Kp-index and traffic
//!   APIs plus a UDP race-light listener, each owning one signal field
//! - **Web surface**: status JSON and a control page over axum
//!
//! ## Architecture
//!
//! - `color`, `mode`, `signals` - the vocabulary of the system
//! - `controller` + `handlers` - the lock-free state machine core
//! - `traits` / `hal` - output abstraction and its implementations
//! - `services` - shared-state wrapper, control loop, web, UDP and
//!   monitor tasks (feature-gated)
//!
//! The controller takes every timestamp as a parameter, so all timing
//! rules are testable without sleeping.
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use rs_ampel::{Color, LightController, Mode};
//! use rs_ampel::config::TimingConfig;
//! use rs_ampel::hal::MockLight;
//!
//! let mut controller = LightController::new(MockLight::new(), TimingConfig::default());
//! let t0 = Instant::now();
//! controller.start(t0);
//!
//! // The auto cycle leaves green after 20 seconds.
//! controller.tick(t0 + Duration::from_secs(21));
//! assert_eq!(controller.current_color(), Color::Yellow);
//!
//! // Selecting the active mode toggles to idle.
//! controller.set_mode(Mode::Auto);
//! assert_eq!(controller.target_mode(), Mode::Idle);
//! ```

#![warn(missing_docs)]

/// Lamp color tags and their physical lamp subsets.
pub mod color;
/// Application configuration with env-sourced credentials.
pub mod config;
/// The signal controller: transitions, commits, snapshots.
pub mod controller;
/// Concrete light output implementations (mock, simulated, GPIO).
pub mod hal;
/// Operating modes and per-mode scratch state.
pub mod mode;
/// Deutsche Bahn timetable payload parsing.
pub mod parsing;
/// Typed signal fields written by the data producers.
pub mod signals;
/// The light output trait.
pub mod traits;

mod handlers;

/// Service tasks: shared state, control loop, web, UDP, monitors.
#[cfg(any(feature = "web", feature = "monitors"))]
pub mod services;

// Re-exports for convenience
pub use color::Color;
pub use controller::{LightController, StatusSnapshot};
pub use mode::{Mode, ModeScratch, SOS_PATTERN};
pub use signals::{Signals, SpaceWeatherReport, TrafficReport, WeatherReport};
