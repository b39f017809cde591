//! Lamp color tags and their mapping onto the three physical outputs.
//!
//! A [`Color`] names one of the fixed display patterns the signal can show.
//! Composite patterns (`red_and_yellow`, `all_on`, `green-yellow`) assert
//! more than one lamp at once; [`Color::lamps`] gives the exact subset.
//!
//! # Example
//!
//! ```rust
//! use rs_ampel::Color;
//!
//! assert_eq!(Color::RedAndYellow.lamps(), (true, true, false));
//! assert_eq!(Color::from_text("green-yellow"), Some(Color::GreenYellow));
//! assert_eq!(Color::Red.as_str(), "red");
//! ```

/// Display pattern for the three-lamp signal.
///
/// `Unknown` is the pre-startup value only; the control loop drives the
/// signal to a known color before its first iteration and never sets
/// `Unknown` again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// All lamps dark.
    Off,
    /// Red lamp only.
    Red,
    /// Yellow lamp only.
    Yellow,
    /// Green lamp only.
    Green,
    /// Red and yellow together (pre-green phase, race countdown).
    RedAndYellow,
    /// All three lamps on.
    AllOn,
    /// Green and yellow together (race telemetry value).
    #[serde(rename = "green-yellow")]
    GreenYellow,
    /// Not yet driven to any known state.
    #[default]
    Unknown,
}

impl Color {
    /// Returns the color as its wire/display tag.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Color::Off => "off",
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::RedAndYellow => "red_and_yellow",
            Color::AllOn => "all_on",
            Color::GreenYellow => "green-yellow",
            Color::Unknown => "unknown",
        }
    }

    /// Parse a color tag as used by the control surface.
    ///
    /// Input is trimmed and case-insensitive. `unknown` is not accepted;
    /// it is an internal sentinel, not a commandable state.
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Color::Off),
            "red" => Some(Color::Red),
            "yellow" => Some(Color::Yellow),
            "green" => Some(Color::Green),
            "red_and_yellow" => Some(Color::RedAndYellow),
            "all_on" => Some(Color::AllOn),
            "green-yellow" => Some(Color::GreenYellow),
            _ => None,
        }
    }

    /// Parse the race telemetry vocabulary received over UDP.
    ///
    /// The feed sends exactly `red`, `yellow`, `green`, `black`,
    /// `green-yellow` or `all_on`; `black` means no light and maps to
    /// [`Color::Off`]. Anything else is rejected.
    pub fn from_race_text(s: &str) -> Option<Self> {
        match s.trim() {
            "red" => Some(Color::Red),
            "yellow" => Some(Color::Yellow),
            "green" => Some(Color::Green),
            "black" => Some(Color::Off),
            "green-yellow" => Some(Color::GreenYellow),
            "all_on" => Some(Color::AllOn),
            _ => None,
        }
    }

    /// Lamp subset implied by this color as `(red, yellow, green)`.
    ///
    /// `Unknown` maps to all-off; the output sink always clears every lamp
    /// before asserting the subset, so an unknown state is safe.
    #[inline]
    pub const fn lamps(&self) -> (bool, bool, bool) {
        match self {
            Color::Red => (true, false, false),
            Color::Yellow => (false, true, false),
            Color::Green => (false, false, true),
            Color::RedAndYellow => (true, true, false),
            Color::AllOn => (true, true, true),
            Color::GreenYellow => (false, true, true),
            Color::Off | Color::Unknown => (false, false, false),
        }
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(Color::default(), Color::Unknown);
    }

    #[test]
    fn round_trip_tags() {
        for color in [
            Color::Off,
            Color::Red,
            Color::Yellow,
            Color::Green,
            Color::RedAndYellow,
            Color::AllOn,
            Color::GreenYellow,
        ] {
            assert_eq!(Color::from_text(color.as_str()), Some(color));
        }
    }

    #[test]
    fn unknown_is_not_commandable() {
        assert_eq!(Color::from_text("unknown"), None);
        assert_eq!(Color::from_text(""), None);
        assert_eq!(Color::from_text("blue"), None);
    }

    #[test]
    fn from_text_trims_and_lowercases() {
        assert_eq!(Color::from_text("  RED  "), Some(Color::Red));
        assert_eq!(Color::from_text("Green-Yellow"), Some(Color::GreenYellow));
    }

    #[test]
    fn race_vocabulary() {
        assert_eq!(Color::from_race_text("black"), Some(Color::Off));
        assert_eq!(Color::from_race_text("green-yellow"), Some(Color::GreenYellow));
        assert_eq!(Color::from_race_text("all_on"), Some(Color::AllOn));
        // "off" is not part of the feed vocabulary
        assert_eq!(Color::from_race_text("off"), None);
        assert_eq!(Color::from_race_text("checkered"), None);
    }

    #[test]
    fn composite_lamp_subsets() {
        assert_eq!(Color::RedAndYellow.lamps(), (true, true, false));
        assert_eq!(Color::AllOn.lamps(), (true, true, true));
        assert_eq!(Color::GreenYellow.lamps(), (false, true, true));
        assert_eq!(Color::Off.lamps(), (false, false, false));
        assert_eq!(Color::Unknown.lamps(), (false, false, false));
    }

    #[test]
    fn serde_tags() {
        assert_eq!(serde_json::to_string(&Color::GreenYellow).unwrap(), "\"green-yellow\"");
        assert_eq!(serde_json::to_string(&Color::RedAndYellow).unwrap(), "\"red_and_yellow\"");
        let parsed: Color = serde_json::from_str("\"all_on\"").unwrap();
        assert_eq!(parsed, Color::AllOn);
    }
}
