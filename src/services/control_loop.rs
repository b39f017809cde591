//! The control loop task.
//!
//! Runs the startup lamp test, drives the signal to green, then ticks the
//! controller until shutdown. Each tick locks, decides, commits, unlocks;
//! all sleeping happens outside the lock. The final act after the loop
//! exits is turning every lamp off, exactly once.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::color::Color;
use crate::traits::LightOutput;

use super::shared::SharedLightState;

/// Run the control loop until [`request_shutdown`] is observed.
///
/// [`request_shutdown`]: SharedLightState::request_shutdown
pub async fn run<L: LightOutput + Send + 'static>(state: Arc<SharedLightState<L>>) {
    lamp_test(&state).await;

    state.with_controller(|c| c.start(Instant::now()));
    info!("control loop running");

    while state.is_running() {
        let sleep = state.with_controller(|c| c.tick(Instant::now()));
        tokio::time::sleep(sleep).await;
    }

    state.with_controller(|c| c.lights_out());
    info!("control loop stopped");
}

/// Light each lamp briefly in turn, proving the wiring before the first
/// real color is established.
async fn lamp_test<L: LightOutput>(state: &SharedLightState<L>) {
    info!("running lamp test");
    let hold = state.with_controller(|c| c.timing().lamp_test);
    for color in [Color::Red, Color::Yellow, Color::Green] {
        state.with_controller(|c| c.preview(color));
        tokio::time::sleep(hold).await;
    }
    state.with_controller(|c| c.preview(Color::Off));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::TimingConfig;
    use crate::controller::LightController;
    use crate::hal::MockLight;
    use crate::mode::Mode;

    fn fast_timing() -> TimingConfig {
        let mut timing = TimingConfig::default().with_loop_tick(Duration::from_millis(1));
        timing.lamp_test = Duration::from_millis(1);
        timing
    }

    #[tokio::test]
    async fn loop_runs_and_drains_to_all_off() {
        let state = Arc::new(SharedLightState::new(LightController::new(
            MockLight::new(),
            fast_timing(),
        )));

        let handle = tokio::spawn(run(Arc::clone(&state)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The lamp test plus start have happened and ticking is live.
        state.with_controller(|c| {
            assert_eq!(c.current_color(), crate::color::Color::Green);
            assert!(c.light().write_count > 3);
        });

        state.request_shutdown();
        handle.await.unwrap();

        state.with_controller(|c| {
            assert!(c.light().is_all_off());
            assert_eq!(c.current_color(), Color::Off);
        });
    }

    #[tokio::test]
    async fn loop_applies_pending_mode_changes() {
        let state = Arc::new(SharedLightState::new(LightController::new(
            MockLight::new(),
            fast_timing(),
        )));

        let handle = tokio::spawn(run(Arc::clone(&state)));
        tokio::time::sleep(Duration::from_millis(30)).await;

        state.set_mode(Mode::Emergency);
        tokio::time::sleep(Duration::from_millis(30)).await;
        state.with_controller(|c| assert_eq!(c.current_mode(), Mode::Emergency));

        state.request_shutdown();
        handle.await.unwrap();
    }
}
