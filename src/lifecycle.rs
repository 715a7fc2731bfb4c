use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::{ReminderError, StoreError};
use crate::reminder::{DueReminder, RemindAt, Reminder, ReminderId, SenderId};
use crate::storage::ReminderStore;
use crate::time_expression::TimeExpressionParser;

/// Validates and persists reminders and reads back the due ones.
pub struct ReminderLifecycleManager {
    store: Arc<dyn ReminderStore>,
    parser: Arc<dyn TimeExpressionParser>,
}

impl ReminderLifecycleManager {
    pub fn new(store: Arc<dyn ReminderStore>, parser: Arc<dyn TimeExpressionParser>) -> Self {
        Self { store, parser }
    }

    /// Extracts task and time from a free-form message and stores the reminder.
    pub async fn create_from_text(
        &self,
        text: &str,
        sender_id: SenderId,
        now: DateTime<Tz>,
    ) -> Result<Reminder, ReminderError> {
        let time_match = self
            .parser
            .parse(text, now)
            .ok_or(ReminderError::ParseNoMatch)?;
        let task = time_match.task_text(text);

        self.create(task, RemindAt::new(time_match.time), sender_id, now)
            .await
    }

    pub async fn create(
        &self,
        object: &str,
        remind_at: RemindAt,
        sender_id: SenderId,
        now: DateTime<Tz>,
    ) -> Result<Reminder, ReminderError> {
        let reminder = Reminder::new(object, remind_at, sender_id, RemindAt::new(now))?;

        log::info!(
            "Creating new reminder for {} at {}: {:?}",
            reminder.sender_id,
            reminder.remind_at,
            reminder.object
        );

        match self.store.insert(&reminder).await {
            Ok(Some(id)) => {
                log::info!("Successfully created reminder {id}");
                Ok(reminder)
            }
            Ok(None) => {
                log::info!("Successfully created reminder, store did not report its id");
                Ok(reminder)
            }
            Err(error) => {
                log::error!(
                    "Could not store reminder for {} at {} ({:?}): {error}",
                    reminder.sender_id,
                    reminder.remind_at,
                    reminder.object
                );
                Err(error.into())
            }
        }
    }

    pub async fn list_due(&self, now: &RemindAt) -> Result<Vec<DueReminder>, StoreError> {
        log::info!("Fetching pending reminders for time: {now}");
        let due = self.store.list_due(now).await?;
        log::info!("Found {} pending reminders", due.len());

        Ok(due)
    }

    /// Deletes every reminder due at `now`. Call only after a non-empty
    /// `list_due` with the same cutoff.
    pub async fn purge_due(&self, now: &RemindAt) -> Result<usize, StoreError> {
        log::info!("Deleting reminders before: {now}");
        let deleted = self.store.delete_due(now).await?;
        log::info!("Deleted {deleted} passed reminders");

        Ok(deleted)
    }

    pub async fn purge_delivered(&self, ids: &[ReminderId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        log::info!("Deleting delivered reminders {ids:?}");
        let deleted = self.store.delete_by_ids(ids).await?;
        log::info!("Deleted {deleted} delivered reminders");

        Ok(deleted)
    }
}
