//! Hardware abstraction for the three-lamp signal.
//!
//! Implement [`LightOutput`] for your lamp driver. The contract is small:
//! one call sets the complete lamp subset, so the implementation clears
//! all three lines and then asserts the requested ones. The controller
//! serializes all writes, so implementations never see concurrent calls.
//!
//! # Example
//!
//! ```rust
//! use rs_ampel::traits::LightOutput;
//! use rs_ampel::hal::MockLight;
//! use rs_ampel::Color;
//!
//! let mut light = MockLight::new();
//! let (r, y, _g) = Color::RedAndYellow.lamps();
//! light.set_lamps(r, y, false).unwrap();
//! assert!(light.red && light.yellow && !light.green);
//! ```

use crate::color::Color;

/// Driver for the three physical lamp lines.
///
/// # Implementation Notes
///
/// - `set_lamps` replaces the whole lamp state: clear everything first,
///   then assert the requested subset. Partial updates are not allowed.
/// - Active-low wiring is the implementation's concern; callers always
///   pass `true` for "lamp visibly on".
/// - Failures are reported, not retried; the controller logs and keeps
///   its last committed state so the next differing decision supersedes.
pub trait LightOutput {
    /// Error type for lamp writes.
    type Error: core::fmt::Debug;

    /// Drive the lamp lines to exactly `(red, yellow, green)`.
    fn set_lamps(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), Self::Error>;

    /// Drive the lamps to the subset implied by a [`Color`] tag.
    fn set_state(&mut self, color: Color) -> Result<(), Self::Error> {
        let (red, yellow, green) = color.lamps();
        self.set_lamps(red, yellow, green)
    }

    /// Convenience method to turn every lamp off.
    fn all_off(&mut self) -> Result<(), Self::Error> {
        self.set_lamps(false, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestLight {
        lamps: (bool, bool, bool),
        writes: usize,
    }

    impl LightOutput for TestLight {
        type Error = ();

        fn set_lamps(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), ()> {
            self.lamps = (red, yellow, green);
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn set_state_default_impl_uses_color_subset() {
        let mut light = TestLight { lamps: (false, false, false), writes: 0 };
        light.set_state(Color::GreenYellow).unwrap();
        assert_eq!(light.lamps, (false, true, true));
        assert_eq!(light.writes, 1);
    }

    #[test]
    fn all_off_default_impl() {
        let mut light = TestLight { lamps: (true, true, true), writes: 0 };
        light.all_off().unwrap();
        assert_eq!(light.lamps, (false, false, false));
    }
}
