//! Concrete [`LightOutput`](crate::traits::LightOutput) implementations.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MockLight`] | Test double that records writes and can inject failures |
//! | [`SimulatedLight`] | Log-only sink, the fallback when no hardware is present |
//! | [`SysfsLight`] | Raspberry Pi GPIO via the Linux sysfs interface |

mod mock;
mod sysfs;

pub use mock::{MockLight, SimulatedLight};
pub use sysfs::SysfsLight;
