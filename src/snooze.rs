use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

use crate::delivery::{Messenger, confirmation_text};
use crate::error::{ProtocolError, ReminderError};
use crate::lifecycle::ReminderLifecycleManager;
use crate::reminder::{RemindAt, Reminder, ReminderId, SenderId};

/// Telegram rejects callback data longer than this many bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

const PAYLOAD_SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnoozeDuration {
    FiveMinutes,
    TwentyMinutes,
    OneHour,
    ThreeHours,
    OneDay,
}

impl SnoozeDuration {
    pub const ALL: [SnoozeDuration; 5] = [
        SnoozeDuration::FiveMinutes,
        SnoozeDuration::TwentyMinutes,
        SnoozeDuration::OneHour,
        SnoozeDuration::ThreeHours,
        SnoozeDuration::OneDay,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SnoozeDuration::FiveMinutes => "5m",
            SnoozeDuration::TwentyMinutes => "20m",
            SnoozeDuration::OneHour => "1h",
            SnoozeDuration::ThreeHours => "3h",
            SnoozeDuration::OneDay => "1d",
        }
    }

    pub fn duration(&self) -> TimeDelta {
        match self {
            SnoozeDuration::FiveMinutes => TimeDelta::minutes(5),
            SnoozeDuration::TwentyMinutes => TimeDelta::minutes(20),
            SnoozeDuration::OneHour => TimeDelta::hours(1),
            SnoozeDuration::ThreeHours => TimeDelta::hours(3),
            SnoozeDuration::OneDay => TimeDelta::hours(24),
        }
    }
}

impl FromStr for SnoozeDuration {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SnoozeDuration::ALL
            .into_iter()
            .find(|duration| duration.key() == s)
            .ok_or_else(|| ProtocolError::UnknownDuration(s.to_string()))
    }
}

impl fmt::Display for SnoozeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Callback payload of a snooze button: `id|task|duration`.
///
/// The task text sits between the first and the last separator so it may
/// itself contain `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozePayload {
    pub reminder_id: ReminderId,
    pub object: String,
    pub duration: SnoozeDuration,
}

impl SnoozePayload {
    /// Encodes the payload, shortening the task text to fit `MAX_PAYLOAD_LEN`.
    pub fn encode(&self) -> String {
        let id = self.reminder_id.to_string();
        let key = self.duration.key();
        let budget = MAX_PAYLOAD_LEN.saturating_sub(id.len() + key.len() + 2);

        format!(
            "{id}{PAYLOAD_SEPARATOR}{}{PAYLOAD_SEPARATOR}{key}",
            truncate(&self.object, budget)
        )
    }
}

impl FromStr for SnoozePayload {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::Malformed(s.to_string());

        let (id, rest) = s.split_once(PAYLOAD_SEPARATOR).ok_or_else(malformed)?;
        let (object, key) = rest.rsplit_once(PAYLOAD_SEPARATOR).ok_or_else(malformed)?;
        if object.trim().is_empty() {
            return Err(malformed());
        }

        let reminder_id = id
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidIdentity(id.to_string()))?;
        let duration = key.trim().parse()?;

        Ok(Self {
            reminder_id,
            object: object.to_string(),
            duration,
        })
    }
}

fn truncate(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }

    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|i| *i <= max_len)
        .last()
        .unwrap_or(0);
    &text[..end]
}

/// Re-enters a snoozed reminder into the lifecycle without parsing text.
pub struct SnoozeProtocolHandler {
    lifecycle: Arc<ReminderLifecycleManager>,
    messenger: Arc<dyn Messenger>,
}

impl SnoozeProtocolHandler {
    pub fn new(lifecycle: Arc<ReminderLifecycleManager>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            lifecycle,
            messenger,
        }
    }

    /// Handles one snooze selection. The interaction is acknowledged exactly
    /// once whatever the outcome, and the requester always gets a message.
    pub async fn handle(
        &self,
        sender_id: SenderId,
        interaction_id: &str,
        payload: &str,
        now: DateTime<Tz>,
    ) -> Result<Reminder, ReminderError> {
        let outcome = self.snooze(sender_id, payload, now).await;

        if let Err(error) = self.messenger.respond_to_interaction(interaction_id).await {
            log::warn!("Could not acknowledge interaction {interaction_id} for {sender_id}: {error}");
        }

        let reply = match &outcome {
            Ok(reminder) => confirmation_text(reminder, &now.timezone()),
            Err(error) => {
                log::warn!("Snooze {payload:?} from {sender_id} failed: {error}");
                error.user_message().to_string()
            }
        };

        if let Err(error) = self.messenger.send(sender_id, &reply, None).await {
            log::error!("Could not send snooze reply to {sender_id}: {error}");
            if outcome.is_ok() {
                return Err(error.into());
            }
        }

        outcome
    }

    async fn snooze(
        &self,
        sender_id: SenderId,
        payload: &str,
        now: DateTime<Tz>,
    ) -> Result<Reminder, ReminderError> {
        let payload: SnoozePayload = payload.parse()?;
        let remind_at = RemindAt::new(now + payload.duration.duration());

        log::info!(
            "Snoozing reminder {} by {} for {sender_id}",
            payload.reminder_id,
            payload.duration
        );

        self.lifecycle
            .create(&payload.object, remind_at, sender_id, now)
            .await
    }
}
