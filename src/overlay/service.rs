use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::storage::KeyValueStore;

use super::{controller::OverlayController, gesture::TouchEvent};

/// Everything the host can tell the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlaySignal {
    Enable,
    Disable,
    /// Re-create the window, picking up changed settings.
    Restart,
    /// The device was locked or unlocked (or the screen turned on/off).
    LockStateChanged,
    Touch(TouchEvent),
}

/// Event loop of the overlay. Applies signals in order until the channel closes or shutdown is
/// requested, then takes the overlay down the same way a disable signal would.
pub struct OverlayService<S, E> {
    receiver: mpsc::Receiver<OverlaySignal>,
    controller: OverlayController<S, E>,
    shutdown: CancellationToken,
}

impl<S: KeyValueStore, E: KeyValueStore> OverlayService<S, E> {
    pub fn new(
        receiver: mpsc::Receiver<OverlaySignal>,
        controller: OverlayController<S, E>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            controller,
            shutdown,
        }
    }

    async fn apply(&mut self, signal: OverlaySignal) -> Result<()> {
        match signal {
            OverlaySignal::Enable => {
                self.controller.enable().await?;
            }
            OverlaySignal::Disable => self.controller.disable().await?,
            OverlaySignal::Restart => {
                self.controller.restart().await?;
            }
            OverlaySignal::LockStateChanged => self.controller.on_lock_state_changed()?,
            OverlaySignal::Touch(touch) => {
                self.controller.handle_touch(touch).await?;
            }
        }
        Ok(())
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            let signal = tokio::select! {
                // Cancelation stops the loop even with signals still queued.
                _ = self.shutdown.cancelled() => break,
                signal = self.receiver.recv() => signal,
            };
            let Some(signal) = signal else {
                break;
            };
            debug!("Processing signal {:?}", signal);
            if let Err(e) = self.apply(signal).await {
                error!("Error processing signal {:?}: {e:?}", signal)
            }
        }

        info!("Overlay service stopping");
        self.receiver.close();
        self.controller.disable().await
    }
}
