//! Raspberry Pi GPIO lamp driver via the Linux sysfs interface.
//!
//! Each lamp pin is exported under `/sys/class/gpio`, configured as an
//! output, and driven by writing `0`/`1` to its `value` file. The relay
//! board in the reference wiring is active-low, so the logical "on" level
//! is configurable.
//!
//! Construction fails when the sysfs tree is missing or not writable
//! (e.g. on a desktop machine); callers are expected to fall back to
//! [`SimulatedLight`](crate::hal::SimulatedLight) in that case.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::GpioConfig;
use crate::traits::LightOutput;

const GPIO_ROOT: &str = "/sys/class/gpio";

struct Pin {
    number: u8,
    value_path: PathBuf,
}

impl Pin {
    fn export(number: u8) -> io::Result<Self> {
        let pin_dir = PathBuf::from(format!("{GPIO_ROOT}/gpio{number}"));
        if !pin_dir.exists() {
            fs::write(format!("{GPIO_ROOT}/export"), number.to_string())?;
        }
        fs::write(pin_dir.join("direction"), "out")?;
        debug!(pin = number, "exported GPIO pin");
        Ok(Self { number, value_path: pin_dir.join("value") })
    }

    fn write(&self, level: bool) -> io::Result<()> {
        let mut file = fs::OpenOptions::new().write(true).open(&self.value_path)?;
        file.write_all(if level { b"1" } else { b"0" })
    }
}

/// GPIO-backed lamp driver.
pub struct SysfsLight {
    red: Pin,
    yellow: Pin,
    green: Pin,
    active_high: bool,
}

impl SysfsLight {
    /// Export and configure the three lamp pins.
    ///
    /// Returns an error when the sysfs GPIO tree is unavailable, leaving
    /// the caller free to fall back to a simulated sink.
    pub fn from_config(config: &GpioConfig) -> io::Result<Self> {
        let light = Self {
            red: Pin::export(config.red_pin)?,
            yellow: Pin::export(config.yellow_pin)?,
            green: Pin::export(config.green_pin)?,
            active_high: config.active_high,
        };
        info!(
            red = config.red_pin,
            yellow = config.yellow_pin,
            green = config.green_pin,
            active_high = config.active_high,
            "GPIO lamp driver ready"
        );
        Ok(light)
    }

    fn level(&self, on: bool) -> bool {
        if self.active_high {
            on
        } else {
            !on
        }
    }
}

impl LightOutput for SysfsLight {
    type Error = io::Error;

    fn set_lamps(&mut self, red: bool, yellow: bool, green: bool) -> Result<(), io::Error> {
        // Clear first so composite patterns never glitch through an
        // intermediate all-on state on partial failure.
        let off = self.level(false);
        self.red.write(off)?;
        self.yellow.write(off)?;
        self.green.write(off)?;

        if red {
            self.red.write(self.level(true))?;
        }
        if yellow {
            self.yellow.write(self.level(true))?;
        }
        if green {
            self.green.write(self.level(true))?;
        }
        Ok(())
    }
}

impl Drop for SysfsLight {
    fn drop(&mut self) {
        // Leave the lamps dark; unexport is deliberately skipped so a
        // restart does not race the kernel tearing the pins down.
        let _ = self.set_lamps(false, false, false);
        debug!(
            red = self.red.number,
            yellow = self.yellow.number,
            green = self.green.number,
            "GPIO lamp driver released"
        );
    }
}
