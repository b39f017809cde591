//! Per-mode decision logic.
//!
//! Each handler is one tick's worth of "what color should the signal show
//! now". Handlers receive the elapsed time since the last color change,
//! write at most one color, and may return a sleep override for the loop
//! (`None` means the default tick). They live in a second `impl` block so
//! the transition machinery in [`controller`](crate::controller) stays
//! separate from the mode rules.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use crate::color::Color;
use crate::controller::LightController;
use crate::mode::{ModeScratch, SOS_PATTERN};
use crate::traits::LightOutput;

/// Race start countdown, one color per second.
const RACE_COUNTDOWN: [Color; 4] = [Color::Red, Color::RedAndYellow, Color::AllOn, Color::Off];

impl<L: LightOutput> LightController<L> {
    /// Regular four-phase cycle. Each phase times out against its
    /// configured duration; the yellow and red+yellow interludes resolve
    /// to the remembered next color.
    pub(crate) fn handle_auto(&mut self, elapsed: Duration, now: Instant) -> Option<Duration> {
        let timing = self.timing().clone();
        match self.current_color() {
            Color::Green if elapsed > timing.auto_green => {
                self.set_color(Color::Yellow, now);
                self.set_scratch(ModeScratch::Auto { next: Color::Red });
            }
            Color::Yellow if elapsed > timing.auto_yellow => {
                let next = self.auto_next();
                self.set_color(next, now);
            }
            Color::Red if elapsed > timing.auto_red => {
                self.set_color(Color::RedAndYellow, now);
                self.set_scratch(ModeScratch::Auto { next: Color::Green });
            }
            Color::RedAndYellow if elapsed > timing.auto_red_yellow => {
                let next = self.auto_next();
                self.set_color(next, now);
            }
            _ => {}
        }
        None
    }

    fn auto_next(&self) -> Color {
        match self.scratch() {
            ModeScratch::Auto { next } => next,
            _ => Color::Red,
        }
    }

    /// Random strobe over the four basic states.
    pub(crate) fn handle_party(&mut self, now: Instant) -> Option<Duration> {
        let color = [Color::Red, Color::Yellow, Color::Green, Color::Off]
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(Color::Off);
        self.set_color(color, now);
        Some(self.timing().party_blink)
    }

    /// Yellow blinker.
    pub(crate) fn handle_emergency(&mut self, now: Instant) -> Option<Duration> {
        self.blink(Color::Yellow, now);
        Some(self.timing().emergency_blink)
    }

    /// Walk the SOS pattern, advancing whenever the current step's hold
    /// time is up and wrapping after the final long pause.
    pub(crate) fn handle_sos(&mut self, elapsed: Duration, now: Instant) -> Option<Duration> {
        if let ModeScratch::Sos { index } = self.scratch() {
            if elapsed > SOS_PATTERN[index].1 {
                let index = (index + 1) % SOS_PATTERN.len();
                self.set_color(SOS_PATTERN[index].0, now);
                self.set_scratch(ModeScratch::Sos { index });
            }
        }
        None
    }

    /// Minutes until the next inbound train, as a color.
    ///
    /// 9 minutes is exactly "leave now", shown as a yellow blink; fewer
    /// means the train is not reachable anymore.
    pub(crate) fn handle_s_bahn(&mut self, now: Instant) -> Option<Duration> {
        let minutes = self.signals().s_bahn_minutes;
        if minutes < 0 {
            self.blink(Color::Red, now);
            Some(self.timing().degraded_blink)
        } else if minutes < 9 {
            self.set_color(Color::Red, now);
            None
        } else if minutes == 9 {
            self.blink(Color::Yellow, now);
            Some(self.timing().degraded_blink)
        } else if minutes <= 12 {
            self.set_color(Color::Yellow, now);
            None
        } else {
            self.set_color(Color::Green, now);
            None
        }
    }

    /// Beer-garden verdict from local hour, temperature and condition.
    pub(crate) fn handle_biergarten(&mut self, now: Instant) -> Option<Duration> {
        let Some(weather) = self.signals().weather.clone() else {
            self.blink(Color::Red, now);
            return Some(self.timing().degraded_blink);
        };

        let hour = self.local_hour();
        let color = if hour < 16
            || weather.temp_c < 15.0
            || weather.condition.contains("Rain")
            || weather.condition.contains("Snow")
        {
            Color::Red
        } else if weather.temp_c < 18.0 || weather.condition.contains("Clouds") {
            Color::Yellow
        } else {
            Color::Green
        };
        self.set_color(color, now);
        None
    }

    /// Race start: a one-second-spaced countdown, then mirror the live
    /// telemetry light at a fast cadence.
    pub(crate) fn handle_racing(&mut self, elapsed: Duration, now: Instant) -> Option<Duration> {
        let ModeScratch::Racing { step } = self.scratch() else {
            return None;
        };
        if (step as usize) < RACE_COUNTDOWN.len() {
            if elapsed > self.timing().racing_step {
                self.set_color(RACE_COUNTDOWN[step as usize], now);
                self.set_scratch(ModeScratch::Racing { step: step + 1 });
            }
            None
        } else {
            let color = self.signals().race_light;
            self.set_color(color, now);
            Some(self.timing().racing_follow)
        }
    }

    /// Planetary Kp index, as a color. A storm (Kp ≥ 5) blinks red like
    /// the no-data case rather than going solid.
    pub(crate) fn handle_space(&mut self, now: Instant) -> Option<Duration> {
        match self.signals().space_weather.clone() {
            None => {
                self.blink(Color::Red, now);
                Some(self.timing().degraded_blink)
            }
            Some(report) if report.kp_index >= 5 => {
                self.blink(Color::Red, now);
                Some(self.timing().degraded_blink)
            }
            Some(report) if report.kp_index == 4 => {
                self.set_color(Color::Yellow, now);
                None
            }
            Some(_) => {
                self.set_color(Color::Green, now);
                None
            }
        }
    }

    /// Average commute delay, as a color.
    pub(crate) fn handle_stau(&mut self, now: Instant) -> Option<Duration> {
        let Some(traffic) = self.signals().traffic.clone() else {
            self.blink(Color::Red, now);
            return Some(self.timing().degraded_blink);
        };
        let color = if traffic.avg_delay_pct > 45.0 {
            Color::Red
        } else if traffic.avg_delay_pct > 20.0 {
            Color::Yellow
        } else {
            Color::Green
        };
        self.set_color(color, now);
        None
    }

    /// Alternate `color` and off, driven by the currently shown color.
    fn blink(&mut self, color: Color, now: Instant) {
        if self.current_color() == color {
            self.set_color(Color::Off, now);
        } else {
            self.set_color(color, now);
        }
    }
}
