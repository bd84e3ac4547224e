//! Cancellable repeating task used for periodic refreshes.
//!
//! A [`Poller`] runs one tick immediately and then once per period. Ticks
//! never overlap: the next one is scheduled only after the previous future
//! has completed. Stopping (or dropping) the poller cancels the schedule and
//! drops any tick still in flight.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Lets a tick check, after an await, whether its poller is still running
#[derive(Clone, Debug)]
pub struct Liveness {
    cancel_rx: watch::Receiver<bool>,
}

impl Liveness {
    /// Liveness of a one-off task with no poller behind it
    pub fn always() -> Self {
        let (_tx, cancel_rx) = watch::channel(false);
        Self { cancel_rx }
    }

    pub fn is_live(&self) -> bool {
        !*self.cancel_rx.borrow()
    }
}

/// Handle to a running repeating task
pub struct Poller {
    name: &'static str,
    cancel_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn `tick` on the current runtime, repeating every `period`
    pub fn start<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut(Liveness) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let liveness = Liveness {
            cancel_rx: cancel_rx.clone(),
        };
        let mut cancel = cancel_rx;
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!(poller = name, period_ms = period.as_millis() as u64, "poller started");

            loop {
                tokio::select! {
                    _ = cancel.changed() => break,
                    _ = interval.tick() => {}
                }
                if *cancel.borrow() {
                    break;
                }

                tokio::select! {
                    _ = cancel.changed() => break,
                    () = tick(liveness.clone()) => {}
                }
            }

            debug!(poller = name, "poller stopped");
        });

        Self {
            name,
            cancel_tx,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !*self.cancel_tx.borrow() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the schedule and wait for the task to wind down
    pub async fn stop(mut self) {
        let _ = self.cancel_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}
