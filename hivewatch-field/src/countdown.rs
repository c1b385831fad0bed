//! Cancellable auto-store countdown
//!
//! One scheduled task produces 1 Hz tick events and a terminal fire
//! event. Cancellation covers both atomically: after `cancel()`
//! neither a tick nor the fire can be delivered, so a stale timer can
//! never act on a discarded draft.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Seconds remaining after this tick
    Tick(u64),
    /// Countdown reached zero
    Fire,
}

pub struct Countdown {
    token: CancellationToken,
    events: mpsc::Receiver<CountdownEvent>,
}

impl Countdown {
    /// Start a countdown of `seconds`, ticking once per second until
    /// the terminal fire.
    pub fn start(seconds: u64) -> Self {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(8);
        let task_token = token.clone();

        tokio::spawn(async move {
            if seconds == 0 {
                let _ = tx.send(CountdownEvent::Fire).await;
                return;
            }
            let mut remaining = seconds;
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => return,
                    _ = interval.tick() => {
                        remaining -= 1;
                        if remaining == 0 {
                            let _ = tx.send(CountdownEvent::Fire).await;
                            return;
                        }
                        if tx.send(CountdownEvent::Tick(remaining)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Countdown { token, events: rx }
    }

    /// Next event. None once cancelled or after the fire was
    /// consumed.
    pub async fn next(&mut self) -> Option<CountdownEvent> {
        tokio::select! {
            _ = self.token.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Cancel the ticker and the pending fire together.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
