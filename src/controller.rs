//! The signal controller: mode arbitration, transitions, and color commits.
//!
//! [`LightController`] owns the lamp driver and all mutable state. It has
//! **no internal locking**: every method takes `&mut self`, and the one
//! mutex lives in [`SharedLightState`](crate::services::SharedLightState),
//! whose public mutators lock once and call straight into this lock-free
//! core. That structure is what makes the loop's nested color writes safe
//! without a re-entrant lock.
//!
//! Time is always passed in as an [`Instant`], never read inside, so every
//! timing rule is testable without sleeping.
//!
//! # Example
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
//! assert_eq!(controller.current_color(), Color::Green);
//!
//! // Auto mode: green times out after 20s and yields yellow.
//! controller.tick(t0 + Duration::from_secs(21));
//! assert_eq!(controller.current_color(), Color::Yellow);
//! ```

use std::time::{Duration, Instant};

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use crate::color::Color;
use crate::config::TimingConfig;
use crate::mode::{Mode, ModeScratch};
use crate::signals::{Signals, SpaceWeatherReport, TrafficReport, WeatherReport};
use crate::traits::LightOutput;

/// Central signal controller.
///
/// Coordinates mode transitions, dispatches to the active mode handler,
/// and commits colors to the lamp driver. Wrap it in
/// [`SharedLightState`](crate::services::SharedLightState) to share it
/// between the control loop, the web surface and the data producers.
pub struct LightController<L: LightOutput> {
    light: L,
    timing: TimingConfig,

    current_mode: Mode,
    target_mode: Mode,
    target_manual_color: Color,
    current_color: Color,
    /// Stamp of the last committed color change; elapsed time for the
    /// time-driven modes is measured from here.
    last_change: Instant,
    scratch: ModeScratch,
    signals: Signals,

    /// Pinned wall-clock hour for deterministic tests of the hour rule.
    fixed_hour: Option<u32>,
}

impl<L: LightOutput> LightController<L> {
    /// Create a controller in auto mode with the color still unknown.
    ///
    /// Call [`start`](Self::start) before the first tick to drive the
    /// signal to a defined color.
    pub fn new(light: L, timing: TimingConfig) -> Self {
        Self {
            light,
            timing,
            current_mode: Mode::Auto,
            target_mode: Mode::Auto,
            target_manual_color: Color::Off,
            current_color: Color::Unknown,
            last_change: Instant::now(),
            scratch: ModeScratch::Auto { next: Color::Green },
            signals: Signals::default(),
            fixed_hour: None,
        }
    }

    /// Pin the wall-clock hour used by the biergarten rule.
    pub fn with_fixed_hour(mut self, hour: u32) -> Self {
        self.fixed_hour = Some(hour);
        self
    }

    // ========================================================================
    // Color commits
    // ========================================================================

    /// Commit a color to the lamp driver.
    ///
    /// Idempotent: re-requesting the current color performs no hardware
    /// write and leaves the change stamp untouched. On a hardware write
    /// failure the state does not advance either; the command is not
    /// retried, only superseded by the next differing decision.
    pub fn set_color(&mut self, color: Color, now: Instant) {
        if self.current_color == color {
            trace!(color = %color, "light already set; skipping write");
            return;
        }
        match self.light.set_state(color) {
            Ok(()) => {
                debug!(from = %self.current_color, to = %color, "light changed");
                self.current_color = color;
                self.last_change = now;
            }
            Err(e) => {
                error!(color = %color, error = ?e, "lamp write failed");
            }
        }
    }

    /// Drive the lamps directly, bypassing idempotence bookkeeping.
    ///
    /// Used by the startup lamp test, before [`start`](Self::start)
    /// establishes the first real color.
    pub fn preview(&mut self, color: Color) {
        if let Err(e) = self.light.set_state(color) {
            error!(color = %color, error = ?e, "lamp test write failed");
        }
    }

    /// Force every lamp off and record the off state.
    ///
    /// The shutdown path calls this exactly once after the loop exits.
    pub fn lights_out(&mut self) {
        if let Err(e) = self.light.all_off() {
            error!(error = ?e, "failed to clear lamps on shutdown");
        }
        self.current_color = Color::Off;
        info!("lamps off");
    }

    // ========================================================================
    // Mode selection
    // ========================================================================

    /// Request a mode, with toggle semantics.
    ///
    /// Selecting the mode that is already active targets [`Mode::Idle`]
    /// instead (toggle-off); anything else becomes the new target. The
    /// transition itself happens on the next tick.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.current_mode == mode {
            info!(mode = %mode, "toggling mode off");
            self.target_mode = Mode::Idle;
        } else {
            info!(mode = %mode, "mode selected");
            self.target_mode = mode;
        }
    }

    /// Request a manual color, with toggle semantics, and target manual
    /// mode.
    ///
    /// Re-selecting the color currently shown while already in manual mode
    /// targets `off` instead.
    pub fn set_manual_color(&mut self, color: Color) {
        if self.current_mode == Mode::Manual && self.current_color == color {
            self.target_manual_color = Color::Off;
        } else {
            self.target_manual_color = color;
        }
        self.target_mode = Mode::Manual;
        info!(color = %color, "manual color selected");
    }

    // ========================================================================
    // Control loop core
    // ========================================================================

    /// Establish the initial state before the first loop iteration:
    /// force green and stamp the change time, regardless of mode.
    pub fn start(&mut self, now: Instant) {
        self.set_color(Color::Green, now);
        self.last_change = now;
    }

    /// One control loop iteration.
    ///
    /// Order is fixed: pending transition → manual override → elapsed
    /// computation → handler dispatch. Returns how long the loop should
    /// sleep before the next tick (the handler's override or the default
    /// tick).
    pub fn tick(&mut self, now: Instant) -> Duration {
        if self.target_mode != self.current_mode {
            self.transition_to(self.target_mode, now);
        }

        // Manual color may change every tick without a mode transition.
        if self.current_mode == Mode::Manual {
            let color = self.target_manual_color;
            self.set_color(color, now);
        }

        let elapsed = now.saturating_duration_since(self.last_change);

        let custom_sleep = match self.current_mode {
            Mode::Auto => self.handle_auto(elapsed, now),
            Mode::Party => self.handle_party(now),
            Mode::Emergency => self.handle_emergency(now),
            Mode::Sos => self.handle_sos(elapsed, now),
            Mode::SBahn => self.handle_s_bahn(now),
            Mode::Biergarten => self.handle_biergarten(now),
            Mode::Racing => self.handle_racing(elapsed, now),
            Mode::Space => self.handle_space(now),
            Mode::Stau => self.handle_stau(now),
            Mode::Manual | Mode::Idle => None,
        };

        custom_sleep.unwrap_or(self.timing.loop_tick)
    }

    /// Perform a pending mode transition: record the mode, stamp the
    /// change time, rebuild scratch, and run the mode's entry action.
    fn transition_to(&mut self, new_mode: Mode, now: Instant) {
        info!(from = %self.current_mode, to = %new_mode, "mode transition");

        self.current_mode = new_mode;
        self.last_change = now;
        self.scratch = ModeScratch::for_mode(new_mode);

        match new_mode {
            Mode::Auto => self.set_color(Color::Red, now),
            Mode::Sos | Mode::Racing | Mode::Idle => self.set_color(Color::Off, now),
            // Every other mode establishes its color on the first
            // handler invocation.
            _ => {}
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Currently displayed color.
    pub fn current_color(&self) -> Color {
        self.current_color
    }

    /// Currently active mode.
    pub fn current_mode(&self) -> Mode {
        self.current_mode
    }

    /// Requested mode, applied on the next tick.
    pub fn target_mode(&self) -> Mode {
        self.target_mode
    }

    /// Requested manual color.
    pub fn target_manual_color(&self) -> Color {
        self.target_manual_color
    }

    /// Stamp of the last committed color change.
    pub fn last_change(&self) -> Instant {
        self.last_change
    }

    /// The lamp driver, for inspection in tests.
    pub fn light(&self) -> &L {
        &self.light
    }

    pub(crate) fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub(crate) fn signals(&self) -> &Signals {
        &self.signals
    }

    pub(crate) fn scratch(&self) -> ModeScratch {
        self.scratch
    }

    pub(crate) fn set_scratch(&mut self, scratch: ModeScratch) {
        self.scratch = scratch;
    }

    /// Local wall-clock hour, or the pinned test hour.
    pub(crate) fn local_hour(&self) -> u32 {
        self.fixed_hour.unwrap_or_else(|| chrono::Local::now().hour())
    }

    /// Read-only status snapshot for the web surface.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            color: self.current_color,
            mode: self.current_mode,
            s_bahn_minutes: self.signals.s_bahn_minutes,
            weather: self.signals.weather.clone(),
            race_step: self.scratch.race_step(),
            space_weather: self.signals.space_weather.clone(),
            traffic: self.signals.traffic.clone(),
        }
    }

    // ========================================================================
    // Producer-owned fields
    // ========================================================================

    /// Train producer: minutes until the next inbound train, `None` for
    /// no data (stored as the `-1` sentinel).
    pub fn set_train_minutes(&mut self, minutes: Option<u32>) {
        self.signals.s_bahn_minutes = minutes.map(|m| m as i32).unwrap_or(-1);
    }

    /// Weather producer.
    pub fn set_weather(&mut self, weather: Option<WeatherReport>) {
        self.signals.weather = weather;
    }

    /// Race-light datagram listener.
    pub fn set_race_light(&mut self, color: Color) {
        self.signals.race_light = color;
    }

    /// Space-weather producer.
    pub fn set_space_weather(&mut self, report: Option<SpaceWeatherReport>) {
        self.signals.space_weather = report;
    }

    /// Traffic producer.
    pub fn set_traffic(&mut self, report: Option<TrafficReport>) {
        self.signals.traffic = report;
    }
}

/// Read-only system snapshot, served as JSON by the web surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Currently displayed color.
    pub color: Color,
    /// Currently active mode.
    pub mode: Mode,
    /// Minutes until the next inbound train; `-1` when unknown.
    pub s_bahn_minutes: i32,
    /// Latest weather report, if any.
    pub weather: Option<WeatherReport>,
    /// Race countdown step (0 outside racing mode).
    pub race_step: u8,
    /// Latest Kp report, if any.
    pub space_weather: Option<SpaceWeatherReport>,
    /// Latest traffic report, if any.
    pub traffic: Option<TrafficReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLight;

    fn controller() -> LightController<MockLight> {
        LightController::new(MockLight::new(), TimingConfig::default())
    }

    #[test]
    fn starts_unknown_then_green() {
        let mut c = controller();
        assert_eq!(c.current_color(), Color::Unknown);
        let t0 = Instant::now();
        c.start(t0);
        assert_eq!(c.current_color(), Color::Green);
        assert_eq!(c.last_change(), t0);
    }

    #[test]
    fn set_color_is_idempotent() {
        let mut c = controller();
        let t0 = Instant::now();
        c.set_color(Color::Red, t0);
        let writes = c.light().write_count;
        let stamp = c.last_change();

        c.set_color(Color::Red, t0 + Duration::from_secs(5));
        assert_eq!(c.light().write_count, writes, "no second hardware write");
        assert_eq!(c.last_change(), stamp, "stamp untouched by a no-op");
    }

    #[test]
    fn failed_write_does_not_advance_state() {
        let mut c = LightController::new(
            MockLight { fail_writes: true, ..MockLight::default() },
            TimingConfig::default(),
        );
        let t0 = Instant::now();
        let stamp = c.last_change();
        c.set_color(Color::Red, t0);
        assert_eq!(c.current_color(), Color::Unknown);
        assert_eq!(c.last_change(), stamp);
        assert_eq!(c.light().write_count, 0);
    }

    #[test]
    fn mode_toggle_targets_idle() {
        let mut c = controller();
        c.set_mode(Mode::Party);
        assert_eq!(c.target_mode(), Mode::Party);

        // Make party current, then re-select it.
        c.tick(Instant::now());
        c.set_mode(Mode::Party);
        assert_eq!(c.target_mode(), Mode::Idle);
    }

    #[test]
    fn manual_color_toggle_targets_off() {
        let mut c = controller();
        let t0 = Instant::now();
        c.start(t0);
        c.set_manual_color(Color::Red);
        assert_eq!(c.target_mode(), Mode::Manual);
        c.tick(t0);
        assert_eq!(c.current_mode(), Mode::Manual);
        assert_eq!(c.current_color(), Color::Red);

        c.set_manual_color(Color::Red);
        assert_eq!(c.target_manual_color(), Color::Off);
        c.tick(t0);
        assert_eq!(c.current_color(), Color::Off);
    }

    #[test]
    fn manual_color_applies_every_tick_without_transition() {
        let mut c = controller();
        let t0 = Instant::now();
        c.start(t0);
        c.set_manual_color(Color::Yellow);
        c.tick(t0);
        assert_eq!(c.current_color(), Color::Yellow);

        // Change the manual color; no transition is pending, but the next
        // tick still applies it.
        c.set_manual_color(Color::Green);
        assert_eq!(c.current_mode(), Mode::Manual);
        c.tick(t0 + Duration::from_millis(200));
        assert_eq!(c.current_color(), Color::Green);
    }

    #[test]
    fn transition_entry_actions() {
        let t0 = Instant::now();

        let mut c = controller();
        c.start(t0);
        c.set_mode(Mode::Sos);
        c.tick(t0);
        assert_eq!(c.current_mode(), Mode::Sos);
        assert_eq!(c.scratch(), ModeScratch::Sos { index: 0 });
        assert_eq!(c.current_color(), Color::Off);

        let mut c = controller();
        c.start(t0);
        c.set_mode(Mode::Racing);
        c.tick(t0);
        assert_eq!(c.scratch(), ModeScratch::Racing { step: 0 });
        assert_eq!(c.current_color(), Color::Off);

        let mut c = controller();
        c.start(t0);
        c.set_mode(Mode::Idle);
        c.tick(t0);
        assert_eq!(c.current_color(), Color::Off);
    }

    #[test]
    fn auto_entry_sets_red_and_remembers_red_and_yellow() {
        let mut c = controller();
        let t0 = Instant::now();
        c.start(t0);
        // Leave auto, then come back to trigger the entry action.
        c.set_mode(Mode::Idle);
        c.tick(t0);
        c.set_mode(Mode::Auto);
        c.tick(t0);
        assert_eq!(c.current_color(), Color::Red);
        assert_eq!(c.scratch(), ModeScratch::Auto { next: Color::RedAndYellow });
    }

    #[test]
    fn scratch_is_rebuilt_on_every_transition() {
        let mut c = controller();
        let t0 = Instant::now();
        c.start(t0);

        // Walk SOS a few steps so its scratch is non-default.
        c.set_mode(Mode::Sos);
        c.tick(t0);
        c.tick(t0 + Duration::from_millis(300));
        assert_eq!(c.scratch(), ModeScratch::Sos { index: 1 });

        // Racing entry must not see SOS leftovers.
        c.set_mode(Mode::Racing);
        c.tick(t0 + Duration::from_millis(400));
        assert_eq!(c.scratch(), ModeScratch::Racing { step: 0 });
    }

    #[test]
    fn lights_out_clears_and_records_off() {
        let mut c = controller();
        c.start(Instant::now());
        c.lights_out();
        assert_eq!(c.current_color(), Color::Off);
        assert!(c.light().is_all_off());
    }

    #[test]
    fn snapshot_reflects_signals() {
        let mut c = controller();
        c.set_train_minutes(Some(7));
        c.set_weather(Some(WeatherReport { temp_c: 19.0, condition: "Clear".into() }));
        let snap = c.snapshot();
        assert_eq!(snap.s_bahn_minutes, 7);
        assert_eq!(snap.weather.unwrap().condition, "Clear");
        assert_eq!(snap.race_step, 0);

        c.set_train_minutes(None);
        assert_eq!(c.snapshot().s_bahn_minutes, -1);
    }

    #[test]
    fn snapshot_serializes_to_documented_shape() {
        let mut c = controller();
        c.start(Instant::now());
        c.set_space_weather(Some(SpaceWeatherReport { kp_index: 4, condition: "Active".into() }));
        let json = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(json["color"], "green");
        assert_eq!(json["mode"], "auto");
        assert_eq!(json["s_bahn_minutes"], -1);
        assert_eq!(json["race_step"], 0);
        assert_eq!(json["space_weather"]["kp_index"], 4);
        assert!(json["weather"].is_null());
    }
}
