use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::delivery::{Messenger, SnoozeControl, notification_text};
use crate::error::{DeliveryError, StoreError};
use crate::lifecycle::ReminderLifecycleManager;
use crate::reminder::{DueReminder, RemindAt};

/// What a sweep deletes once deliveries have been attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurgePolicy {
    /// Only reminders that were delivered or whose recipient is permanently
    /// unreachable; other failures are retried next sweep.
    #[default]
    Delivered,
    /// Everything due at the sweep cutoff, delivered or not.
    Cutoff,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Failed deliveries that will not be retried.
    pub unreachable: usize,
    pub purged: usize,
}

pub struct NotificationDispatcher {
    lifecycle: Arc<ReminderLifecycleManager>,
    messenger: Arc<dyn Messenger>,
    policy: PurgePolicy,
    sweep_lock: Mutex<()>,
}

impl NotificationDispatcher {
    pub fn new(
        lifecycle: Arc<ReminderLifecycleManager>,
        messenger: Arc<dyn Messenger>,
        policy: PurgePolicy,
    ) -> Self {
        Self {
            lifecycle,
            messenger,
            policy,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Fetches reminders due at `now`, delivers each once and purges them.
    ///
    /// Sweeps never overlap. A failed fetch aborts the sweep before any
    /// delivery; a failed delivery does not stop the remaining ones.
    pub async fn sweep(&self, now: DateTime<Tz>) -> Result<SweepReport, StoreError> {
        let _guard = self.sweep_lock.lock().await;
        let cutoff = RemindAt::new(now);

        let due = self.lifecycle.list_due(&cutoff).await?;
        if due.is_empty() {
            return Ok(SweepReport::default());
        }

        log::info!("Processing {} pending reminders", due.len());
        let mut delivered = Vec::with_capacity(due.len());
        let mut unreachable = Vec::new();
        for reminder in &due {
            match self.deliver(reminder).await {
                Ok(()) => delivered.push(reminder.id),
                Err(error) if error.is_permanent() => {
                    log::warn!(
                        "Dropping reminder {} ({:?}, created {}): {error}",
                        reminder.id,
                        reminder.reminder.object,
                        created_at(reminder)
                    );
                    unreachable.push(reminder.id);
                }
                Err(error) => log::error!(
                    "Could not deliver reminder {} ({:?}, created {}) to {}: {error}",
                    reminder.id,
                    reminder.reminder.object,
                    created_at(reminder),
                    reminder.reminder.sender_id
                ),
            }
        }

        let purged = match self.policy {
            PurgePolicy::Cutoff => self.lifecycle.purge_due(&cutoff).await?,
            PurgePolicy::Delivered => {
                let finished = [delivered.as_slice(), unreachable.as_slice()].concat();
                self.lifecycle.purge_delivered(&finished).await?
            }
        };

        let report = SweepReport {
            due: due.len(),
            delivered: delivered.len(),
            failed: due.len() - delivered.len(),
            unreachable: unreachable.len(),
            purged,
        };
        log::info!("Sweep finished: {report:?}");

        Ok(report)
    }

    async fn deliver(&self, due: &DueReminder) -> Result<(), DeliveryError> {
        let control = SnoozeControl::new(due.id, due.reminder.object.clone());
        let text = notification_text(&due.reminder.object);

        self.messenger
            .send(due.reminder.sender_id, &text, Some(&control))
            .await
    }
}

fn created_at(due: &DueReminder) -> String {
    due.created_at
        .map(|created_at| created_at.to_rfc3339())
        .unwrap_or_else(|| "at an unknown time".to_string())
}
