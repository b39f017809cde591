//! Mock and simulated lamp sinks for testing and hardware-less runs.

use tracing::info;

use crate::traits::LightOutput;

/// Mock lamp driver for tests.
///
/// Records the current lamp lines and counts hardware writes, which makes
/// idempotence checkable (a skipped write leaves `write_count` unchanged).
/// Set `fail_writes` to make every write return an error, for exercising
/// the controller's failure path.
///
/// # Example
///
/// ```rust
/// use rs_ampel::hal::MockLight;
/// use rs_ampel::traits::LightOutput;
///
/// let mut light = MockLight::new();
/// light.set_lamps(true, false, false).unwrap();
/// assert!(light.red);
/// assert_eq!(light.write_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLight {
    /// Red lamp line.
    pub red: bool,
    /// Yellow lamp line.
    pub yellow: bool,
    /// Green lamp line.
    pub green: bool,
    /// Number of `set_lamps` calls that reached the "hardware".
    pub write_count: usize,
    /// When true, every write fails without touching the lamp lines.
    pub fail_writes: bool,
}

impl MockLight {
    /// Creates a mock with all lamps off.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no lamp is lit.
    pub fn is_all_off(&self) -> bool {
        !self.red && !self.yellow && !self.green
    }
}

impl LightOutput for MockLight {
    type Error = &'static str;

    fn set_lamps(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err("simulated write failure");
        }
        self.red = red;
        self.yellow = yellow;
        self.green = green;
        self.write_count += 1;
        Ok(())
    }
}

/// Log-only lamp sink.
///
/// Used when GPIO initialization fails (or off the Pi entirely): every
/// lamp change is logged instead of driven, and writes never fail.
#[derive(Debug, Default)]
pub struct SimulatedLight {
    lamps: (bool, bool, bool),
}

impl SimulatedLight {
    /// Creates a simulated sink with all lamps off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lamp lines as `(red, yellow, green)`.
    pub fn lamps(&self) -> (bool, bool, bool) {
        self.lamps
    }
}

impl LightOutput for SimulatedLight {
    type Error = core::convert::Infallible;

    fn set_lamps(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), Self::Error> {
        self.lamps = (red, yellow, green);
        info!(red, yellow, green, "simulated lamps");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn mock_records_writes() {
        let mut light = MockLight::new();
        light.set_state(Color::AllOn).unwrap();
        assert!(light.red && light.yellow && light.green);
        light.set_state(Color::Off).unwrap();
        assert!(light.is_all_off());
        assert_eq!(light.write_count, 2);
    }

    #[test]
    fn mock_failure_leaves_lamps_untouched() {
        let mut light = MockLight::new();
        light.set_state(Color::Red).unwrap();
        light.fail_writes = true;
        assert!(light.set_state(Color::Green).is_err());
        assert!(light.red && !light.green);
        assert_eq!(light.write_count, 1);
    }

    #[test]
    fn simulated_never_fails() {
        let mut light = SimulatedLight::new();
        light.set_state(Color::GreenYellow).unwrap();
        assert_eq!(light.lamps(), (false, true, true));
    }
}
