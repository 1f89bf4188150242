//! Periodic move of elapsed tasks to the `past` category
//!
//! This is disabled by default. See [`Settings::enable_past_due_sweep`](crate::config::Settings::enable_past_due_sweep)

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::reconciler::Reconciler;
use crate::traits::RecordStore;

/// See [`stop_channel`]
pub type StopSender = watch::Sender<bool>;
/// See [`stop_channel`]
pub type StopReceiver = watch::Receiver<bool>;

/// Create a channel that can be used to stop a running sweep
pub fn stop_channel() -> (StopSender, StopReceiver) {
    watch::channel(false)
}

/// Start sweeping past-due tasks at the interval set in the reconciler settings.
///
/// Returns `None` (and does not spawn anything) if the sweep is disabled.
/// The sweep stops when `true` is sent into `stop`, or when its sender is dropped.
pub fn spawn_past_due_sweep<S>(reconciler: Arc<Mutex<Reconciler<S>>>, mut stop: StopReceiver) -> Option<JoinHandle<()>>
where
    S: RecordStore + 'static,
{
    let settings = match reconciler.try_lock() {
        Ok(rec) => rec.settings().clone(),
        Err(_) => {
            log::warn!("The reconciler is busy. Not starting the past-due sweep");
            return None;
        }
    };
    if !settings.enable_past_due_sweep {
        log::debug!("Past-due sweep is disabled");
        return None;
    }

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(settings.past_due_sweep_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let mut rec = reconciler.lock().await;
                    match rec.sweep_past_due(Utc::now()).await {
                        Ok(0) => (),
                        Ok(n) => log::info!("{} tasks are now past due", n),
                        Err(err) => log::warn!("Past-due sweep failed: {}. Will try again at next tick", err),
                    }
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        log::debug!("Stopping the past-due sweep");
                        break;
                    }
                },
            }
        }
    });
    Some(handle)
}
