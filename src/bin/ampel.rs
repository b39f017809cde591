//! Traffic light controller daemon.
//!
//! Wires everything together: the GPIO lamp driver (or the simulated
//! fallback when no GPIO tree is present), the control loop, the four
//! data monitors, the race-light UDP listener and the web server. On
//! Ctrl-C every task is asked to stop and the loop turns all lamps off
//! before the process exits.
//!
//! Credentials come from the environment (`DB_CLIENT_ID`,
//! `DB_CLIENT_SECRET`, `OWM_API_KEY`, `GOOGLE_MAPS_API_KEY`); a monitor
//! without its credentials simply never starts.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rs_ampel::config::Config;
use rs_ampel::controller::LightController;
use rs_ampel::hal::{SimulatedLight, SysfsLight};
use rs_ampel::services::{control_loop, monitors, udp, web, SharedLightState};
use rs_ampel::traits::LightOutput;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!("traffic light controller starting");

    match SysfsLight::from_config(&config.gpio) {
        Ok(light) => run(light, config).await,
        Err(e) => {
            warn!(error = %e, "GPIO unavailable, falling back to simulated lamps");
            run(SimulatedLight::new(), config).await
        }
    }
}

async fn run<L: LightOutput + Send + 'static>(light: L, config: Config) -> anyhow::Result<()> {
    let state = Arc::new(SharedLightState::new(LightController::new(
        light,
        config.timing.clone(),
    )));

    let loop_task = tokio::spawn(control_loop::run(Arc::clone(&state)));
    tokio::spawn(monitors::s_bahn_monitor(Arc::clone(&state), config.clone()));
    tokio::spawn(monitors::weather_monitor(Arc::clone(&state), config.clone()));
    tokio::spawn(monitors::space_weather_monitor(Arc::clone(&state), config.clone()));
    tokio::spawn(monitors::traffic_monitor(Arc::clone(&state), config.clone()));
    tokio::spawn(udp::run(Arc::clone(&state), config.clone()));

    tokio::select! {
        result = web::serve(Arc::clone(&state), &config.network) => {
            if let Err(e) = result {
                error!(error = %e, "web server failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    // Producers notice the flag within one poll interval; the loop is the
    // one task worth waiting for, since it turns the lamps off last.
    state.request_shutdown();
    loop_task.await?;
    info!("shutdown complete");
    Ok(())
}
