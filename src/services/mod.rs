//! Long-lived service tasks built around one shared controller.
//!
//! Every service holds an `Arc<SharedLightState>` and nothing else in
//! common:
//!
//! - [`control_loop`] owns the tick cadence and is the only writer of
//!   mode and color fields.
//! - [`web`] reads snapshots and writes the target mode / manual color
//!   (feature `web`).
//! - [`monitors`] and [`udp`] each write exactly one signal field
//!   (feature `monitors`).
//!
//! Locking discipline: [`SharedLightState`] holds the single mutex, and
//! every critical section is a short closure with no I/O or sleeping
//! inside.

pub mod control_loop;
#[cfg(feature = "monitors")]
pub mod monitors;
pub mod shared;
#[cfg(feature = "monitors")]
pub mod udp;
#[cfg(feature = "web")]
pub mod web;

pub use shared::SharedLightState;
#[cfg(feature = "web")]
pub use web::build_router;
