//! Shared state wrapper around the controller.
//!
//! [`SharedLightState`] owns the one mutex in the system. The controller
//! itself never locks, so the control loop's nested color writes cannot
//! deadlock: public mutators here lock once and call straight into the
//! lock-free core.
//!
//! # Example
//!
//! ```ignore
//! let state = Arc::new(SharedLightState::new(controller));
//!
//! // Web surface reads a snapshot.
//! let snapshot = state.snapshot();
//!
//! // Producers write their one field.
//! state.with_controller(|c| c.set_train_minutes(Some(11)));
//!
//! // Shutdown from anywhere.
//! state.request_shutdown();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::color::Color;
use crate::controller::{LightController, StatusSnapshot};
use crate::mode::Mode;
use crate::traits::LightOutput;

/// Thread-safe wrapper sharing one [`LightController`] between the
/// control loop, the web surface and the data producers.
///
/// A `Mutex` (not `RwLock`) guards the controller: the loop writes every
/// tick, so reader/writer separation buys nothing and risks writer
/// starvation. The lifecycle flag is a separate atomic so shutdown
/// checks never contend with the controller lock.
pub struct SharedLightState<L: LightOutput> {
    controller: Mutex<LightController<L>>,
    running: AtomicBool,
}

impl<L: LightOutput> SharedLightState<L> {
    /// Wrap a controller; the system starts in the running state.
    pub fn new(controller: LightController<L>) -> Self {
        Self { controller: Mutex::new(controller), running: AtomicBool::new(true) }
    }

    /// Whether the system is still live. Every task polls this at least
    /// once per tick or receive timeout.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Flip the lifecycle flag; every task exits within one interval.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Run a closure against the locked controller.
    ///
    /// The closure pattern keeps critical sections short and prevents
    /// holding the lock across await points.
    pub fn with_controller<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut LightController<L>) -> R,
    {
        let mut guard = self.controller.lock().unwrap();
        f(&mut guard)
    }

    /// Read-only snapshot of the public fields, taken in one critical
    /// section so the fields are mutually consistent.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.with_controller(|c| c.snapshot())
    }

    /// Request a mode, with toggle semantics.
    pub fn set_mode(&self, mode: Mode) {
        self.with_controller(|c| c.set_mode(mode));
    }

    /// Request a manual color, with toggle semantics.
    pub fn set_manual_color(&self, color: Color) {
        self.with_controller(|c| c.set_manual_color(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use crate::config::TimingConfig;
    use crate::hal::MockLight;

    fn shared() -> SharedLightState<MockLight> {
        SharedLightState::new(LightController::new(MockLight::new(), TimingConfig::default()))
    }

    #[test]
    fn lifecycle_flag() {
        let state = shared();
        assert!(state.is_running());
        state.request_shutdown();
        assert!(!state.is_running());
    }

    #[test]
    fn mutators_reach_the_controller() {
        let state = shared();
        state.set_mode(Mode::Party);
        state.set_manual_color(Color::Red);
        // Manual color forces manual mode as the target.
        state.with_controller(|c| {
            assert_eq!(c.target_mode(), Mode::Manual);
            assert_eq!(c.target_manual_color(), Color::Red);
        });
    }

    #[test]
    fn snapshot_is_consistent_under_concurrent_writes() {
        let state = Arc::new(shared());
        state.with_controller(|c| c.start(Instant::now()));

        let writer = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for i in 0..500 {
                    state.with_controller(|c| c.set_train_minutes(Some(i)));
                }
            })
        };
        for _ in 0..500 {
            let snap = state.snapshot();
            assert!(snap.s_bahn_minutes >= -1);
        }
        writer.join().unwrap();
    }
}
