use std::sync::Arc;
use std::time::Duration;

use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::dispatch::NotificationDispatcher;

pub struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    pub fn new(task_handle: JoinHandle<()>, cancellation_token: CancellationToken) -> Self {
        Self {
            task_handle,
            cancellation_token,
        }
    }

    pub async fn cancel(self, timeout: Duration) {
        self.cancellation_token.cancel();
        if time::timeout(timeout, self.task_handle).await.is_err() {
            log::warn!("Sweep ticker did not stop within {timeout:?}");
        }
    }
}

/// Runs a sweep every `period` until cancelled.
pub struct SweepTicker;

impl SweepTicker {
    pub fn spawn(
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        period: Duration,
        cancellation_token: &CancellationToken,
    ) -> ScheduledTask {
        let cancellation_token = cancellation_token.child_token();
        let task_cancellation_token = cancellation_token.clone();

        let task_handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_cancellation_token.cancelled() => {
                        log::info!("Sweep ticker stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(error) = dispatcher.sweep(clock.now()).await {
                            log::error!("Scheduled sweep failed: {error}");
                        }
                    }
                }
            }
        });

        ScheduledTask::new(task_handle, cancellation_token)
    }
}
