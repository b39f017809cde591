//! Core traits for hardware abstraction.
//!
//! The signal hardware is reached exclusively through [`LightOutput`],
//! which keeps the state machine testable on a desk without lamps. See
//! [`crate::hal`] for the concrete implementations.

mod hardware;

pub use hardware::LightOutput;
