//! Scheduler loop — drives `StreamManager::on_tick` from a tokio interval.
//! Sleeps between checks; exits when the shutdown flag flips to true.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use castdeck_core::clock::Clock;
use castdeck_core::traits::NotificationSink;

use crate::manager::StreamManager;

/// Spawn the scheduler loop as a background tokio task.
///
/// Every `poll_interval` the manager is locked and advanced to `clock.now()`.
/// The lock is held only for the tick itself.
pub fn spawn_scheduler<S>(
    manager: Arc<Mutex<StreamManager<S>>>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: NotificationSink + 'static,
{
    tokio::spawn(async move {
        tracing::info!("⏰ Scheduler started (check every {}s)", poll_interval.as_secs());

        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = {
                        let mut manager = manager.lock().await;
                        manager.on_tick(clock.now())
                    };
                    for id in &report.ended {
                        tracing::info!("⏹️ Auto-stop ended stream {}", id);
                    }
                    for id in &report.warned {
                        tracing::info!("🔔 Upcoming warning sent for stream {}", id);
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("🛑 Scheduler stopped");
    })
}
