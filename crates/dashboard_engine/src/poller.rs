use std::sync::Arc;
use std::time::Duration;

use dashboard_core::RefreshOrigin;
use dashboard_logging::{dash_debug, dash_info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reconcile::Reconciler;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic refresh driver.
pub struct Poller;

impl Poller {
    /// Refreshes immediately, then once per `interval`. Ticks missed while a
    /// cycle is running are skipped rather than bunched up.
    pub fn spawn(reconciler: Arc<Reconciler>, interval: Duration) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            dash_info!("Polling every {:?}", interval);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // A started cycle always runs to completion.
                reconciler.refresh(RefreshOrigin::Timer).await;
            }
            dash_debug!("Poller stopped");
        });
        PollerHandle {
            cancel,
            task: Some(task),
        }
    }
}

pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops polling and waits for an in-flight cycle to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
