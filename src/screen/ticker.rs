use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::utils::clock::Clock;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Publishes the current instant once per period so open ended durations keep growing on
/// screen. Does nothing else.
pub struct NowTicker {
    clock: Arc<dyn Clock>,
    period: Duration,
    sender: watch::Sender<DateTime<Utc>>,
    shutdown: CancellationToken,
}

impl NowTicker {
    pub fn new(
        clock: Arc<dyn Clock>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> (Self, watch::Receiver<DateTime<Utc>>) {
        let (sender, receiver) = watch::channel(clock.time());
        (
            Self {
                clock,
                period,
                sender,
                shutdown,
            },
            receiver,
        )
    }

    pub async fn run(self) {
        let mut next_tick = self.clock.instant();
        loop {
            next_tick += self.period;
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return
                }
                _ = self.clock.sleep_until(next_tick) => ()
            }
            let now = self.clock.time();
            trace!("Tick {now}");
            self.sender.send_replace(now);
        }
    }
}
