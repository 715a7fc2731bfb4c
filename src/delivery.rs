use async_trait::async_trait;
use chrono_tz::Tz;

use crate::error::DeliveryError;
use crate::reminder::{Reminder, ReminderId, SenderId};
use crate::snooze::{SnoozeDuration, SnoozePayload};

/// Snooze buttons attached to a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeControl {
    pub reminder_id: ReminderId,
    pub object: String,
}

impl SnoozeControl {
    pub fn new(reminder_id: ReminderId, object: impl Into<String>) -> Self {
        Self {
            reminder_id,
            object: object.into(),
        }
    }

    /// One payload per snooze duration, in display order.
    pub fn options(&self) -> impl Iterator<Item = (SnoozeDuration, SnoozePayload)> + '_ {
        SnoozeDuration::ALL.into_iter().map(|duration| {
            (
                duration,
                SnoozePayload {
                    reminder_id: self.reminder_id,
                    object: self.object.clone(),
                    duration,
                },
            )
        })
    }
}

#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    async fn send(
        &self,
        recipient: SenderId,
        text: &str,
        control: Option<&SnoozeControl>,
    ) -> Result<(), DeliveryError>;

    /// Acknowledges a control interaction so the client stops waiting.
    async fn respond_to_interaction(&self, interaction_id: &str) -> Result<(), DeliveryError>;
}

pub fn notification_text(object: &str) -> String {
    format!("📣 {object}")
}

pub fn confirmation_text(reminder: &Reminder, timezone: &Tz) -> String {
    format!(
        "✅ I will remind you \"{}\" on {}",
        reminder.object,
        reminder.remind_at.display_in(timezone)
    )
}

pub const USAGE_TEXT: &str = "Send me a task followed by when you want to be reminded, for example:
buy milk tomorrow at 9am
call mom in 3 hours
pay rent on March 3rd at noon";
