//! UDP listener for the race telemetry light.
//!
//! The sim rig broadcasts the current flag light as a short UTF-8 word
//! (`red`, `yellow`, `green`, `black`, `green-yellow`, `all_on`). Each
//! valid datagram overwrites the race-light signal field; everything else
//! is dropped. Receives use a short timeout so the task notices shutdown
//! within a second even when the feed is silent.

use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

use crate::color::Color;
use crate::config::Config;
use crate::traits::LightOutput;

use super::shared::SharedLightState;

/// Bind the configured port and listen until shutdown. A failed bind is
/// logged and ends the task; racing mode then just keeps whatever race
/// light it last saw.
pub async fn run<L: LightOutput + Send + 'static>(
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    let addr = config.network.udp_addr();
    let socket = match UdpSocket::bind(addr).await {
        Ok(socket) => socket,
        Err(e) => {
            error!(%addr, error = %e, "race light listener failed to bind");
            return;
        }
    };
    info!(%addr, "race light listener ready");
    listen(socket, state, config).await;
}

async fn listen<L: LightOutput + Send + 'static>(
    socket: UdpSocket,
    state: Arc<SharedLightState<L>>,
    config: Config,
) {
    let mut buf = [0u8; 1024];
    while state.is_running() {
        match timeout(config.timing.udp_recv_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => {
                let Ok(text) = std::str::from_utf8(&buf[..len]) else {
                    continue;
                };
                match Color::from_race_text(text) {
                    Some(color) => {
                        debug!(%color, "race light update");
                        state.with_controller(|c| c.set_race_light(color));
                    }
                    None => trace!(text = text.trim(), "ignoring unrecognized race payload"),
                }
            }
            // Timeout: loop around and re-check the lifecycle flag.
            Err(_) => continue,
            Ok(Err(e)) => {
                debug!(error = %e, "race light receive error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::TimingConfig;
    use crate::controller::LightController;
    use crate::hal::MockLight;

    /// Send `payload` to a live listener whose race light starts at
    /// `initial`, then report the race light after shutdown.
    async fn race_light_after(initial: Color, payload: &[u8]) -> Color {
        let state = Arc::new(SharedLightState::new(LightController::new(
            MockLight::new(),
            TimingConfig::default(),
        )));
        state.with_controller(|c| c.set_race_light(initial));

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let mut config = Config::default();
        config.timing.udp_recv_timeout = Duration::from_millis(20);

        let handle = tokio::spawn(listen(socket, Arc::clone(&state), config));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(payload, addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        state.request_shutdown();
        handle.await.unwrap();
        state.with_controller(|c| c.signals().race_light)
    }

    #[tokio::test]
    async fn valid_payload_updates_race_light() {
        assert_eq!(race_light_after(Color::Off, b"green").await, Color::Green);
    }

    #[tokio::test]
    async fn black_maps_to_off() {
        assert_eq!(race_light_after(Color::Green, b"black").await, Color::Off);
    }

    #[tokio::test]
    async fn unrecognized_payload_is_ignored() {
        assert_eq!(race_light_after(Color::Green, b"checkered").await, Color::Green);
        assert_eq!(race_light_after(Color::Green, b"off").await, Color::Green);
    }
}
