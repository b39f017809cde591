//! Operating modes and their per-mode scratch state.
//!
//! A [`Mode`] selects the strategy that decides the displayed color each
//! tick. The set is closed: the controller dispatches over it with an
//! exhaustive `match`, so adding a mode is a compile-time checked change.
//!
//! [`ModeScratch`] holds the state that is private to one mode (the auto
//! cycle's remembered next color, the SOS pattern index, the race countdown
//! step). It is a tagged enum rebuilt on every transition, so stale values
//! from a previous mode can never leak into the next one.

use std::time::Duration;

use crate::color::Color;

/// Operating mode of the signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Regular traffic-light cycle (green → yellow → red → red+yellow).
    #[default]
    Auto,
    /// Random color strobe.
    Party,
    /// Yellow blinker.
    Emergency,
    /// Morse SOS on all lamps.
    Sos,
    /// Color tracks minutes until the next inbound train.
    SBahn,
    /// Color tracks beer-garden weather (hour, temperature, condition).
    Biergarten,
    /// Race start countdown, then live telemetry follow.
    Racing,
    /// Color tracks the planetary Kp geomagnetic index.
    Space,
    /// Color tracks average commute traffic delay.
    Stau,
    /// Operator-forced color.
    Manual,
    /// Everything off, waiting for a mode selection.
    Idle,
}

impl Mode {
    /// Returns the mode as its wire/display tag.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Party => "party",
            Mode::Emergency => "emergency",
            Mode::Sos => "sos",
            Mode::SBahn => "s_bahn",
            Mode::Biergarten => "biergarten",
            Mode::Racing => "racing",
            Mode::Space => "space",
            Mode::Stau => "stau",
            Mode::Manual => "manual",
            Mode::Idle => "idle",
        }
    }

    /// Parse a mode tag as used by the control surface.
    ///
    /// Input is trimmed and case-insensitive.
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Mode::Auto),
            "party" => Some(Mode::Party),
            "emergency" => Some(Mode::Emergency),
            "sos" => Some(Mode::Sos),
            "s_bahn" => Some(Mode::SBahn),
            "biergarten" => Some(Mode::Biergarten),
            "racing" => Some(Mode::Racing),
            "space" => Some(Mode::Space),
            "stau" => Some(Mode::Stau),
            "manual" => Some(Mode::Manual),
            "idle" => Some(Mode::Idle),
            _ => None,
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode-private scratch state, rebuilt fresh on every transition.
///
/// Only the variant matching the current mode is ever meaningful; modes
/// without scratch state use [`ModeScratch::None`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeScratch {
    /// Auto cycle: the color to show once the current phase times out.
    Auto {
        /// Next color after the yellow / red+yellow interlude.
        next: Color,
    },
    /// SOS pattern position.
    Sos {
        /// Index into [`SOS_PATTERN`].
        index: usize,
    },
    /// Race start countdown position.
    Racing {
        /// Countdown step, 0..4; ≥4 means the live telemetry-follow phase.
        step: u8,
    },
    /// The active mode keeps no scratch state.
    None,
}

impl ModeScratch {
    /// Entry-state scratch for a freshly entered mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Auto => ModeScratch::Auto { next: Color::RedAndYellow },
            Mode::Sos => ModeScratch::Sos { index: 0 },
            Mode::Racing => ModeScratch::Racing { step: 0 },
            _ => ModeScratch::None,
        }
    }

    /// Race countdown step, or 0 when racing is not active.
    pub fn race_step(&self) -> u8 {
        match self {
            ModeScratch::Racing { step } => *step,
            _ => 0,
        }
    }
}

/// The SOS blink pattern: `... --- ...` on all lamps, with a long pause
/// before the pattern repeats. Each entry is (color, hold duration).
pub const SOS_PATTERN: [(Color, Duration); 18] = [
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(400)),
    (Color::AllOn, Duration::from_millis(600)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(600)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(600)),
    (Color::Off, Duration::from_millis(400)),
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(200)),
    (Color::AllOn, Duration::from_millis(200)),
    (Color::Off, Duration::from_millis(1500)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_tags() {
        for mode in [
            Mode::Auto,
            Mode::Party,
            Mode::Emergency,
            Mode::Sos,
            Mode::SBahn,
            Mode::Biergarten,
            Mode::Racing,
            Mode::Space,
            Mode::Stau,
            Mode::Manual,
            Mode::Idle,
        ] {
            assert_eq!(Mode::from_text(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn from_text_rejects_unknown() {
        assert_eq!(Mode::from_text("disco"), None);
        assert_eq!(Mode::from_text(""), None);
    }

    #[test]
    fn serde_tags() {
        assert_eq!(serde_json::to_string(&Mode::SBahn).unwrap(), "\"s_bahn\"");
        assert_eq!(serde_json::to_string(&Mode::Biergarten).unwrap(), "\"biergarten\"");
        let parsed: Mode = serde_json::from_str("\"stau\"").unwrap();
        assert_eq!(parsed, Mode::Stau);
    }

    #[test]
    fn scratch_matches_entry_actions() {
        assert_eq!(
            ModeScratch::for_mode(Mode::Auto),
            ModeScratch::Auto { next: Color::RedAndYellow }
        );
        assert_eq!(ModeScratch::for_mode(Mode::Sos), ModeScratch::Sos { index: 0 });
        assert_eq!(ModeScratch::for_mode(Mode::Racing), ModeScratch::Racing { step: 0 });
        assert_eq!(ModeScratch::for_mode(Mode::Party), ModeScratch::None);
        assert_eq!(ModeScratch::for_mode(Mode::Manual), ModeScratch::None);
    }

    #[test]
    fn race_step_accessor() {
        assert_eq!(ModeScratch::Racing { step: 3 }.race_step(), 3);
        assert_eq!(ModeScratch::None.race_step(), 0);
        assert_eq!(ModeScratch::Sos { index: 5 }.race_step(), 0);
    }

    #[test]
    fn sos_pattern_shape() {
        assert_eq!(SOS_PATTERN.len(), 18);
        // Alternates light and dark throughout.
        for pair in SOS_PATTERN.windows(2) {
            assert_ne!(pair[0].0, pair[1].0);
        }
        // Long inter-word gap at the end.
        assert_eq!(SOS_PATTERN[17], (Color::Off, Duration::from_millis(1500)));
        // Durations stay inside the documented 0.2-1.5s band.
        for (_, d) in SOS_PATTERN {
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(1500));
        }
    }
}
