use teloxide::{ApiError, RequestError};
use thiserror::Error;

use crate::reminder::RemindAt;

pub const INVALID_FORMAT_MESSAGE: &str = "❌ Invalid task and/or date format.";
pub const PAST_DATE_MESSAGE: &str = "❌ Given date should be in the future.";
pub const INTERNAL_FAILURE_MESSAGE: &str =
    "❌ Something wrong happened while handling your message, please try again later.";
pub const INVALID_SNOOZE_MESSAGE: &str = "❌ This snooze option is no longer valid.";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no time phrase or no task text found")]
    NoMatch,

    #[error("reminder time {remind_at} is not after {now}")]
    PastDate { remind_at: RemindAt, now: RemindAt },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Transport(reqwest::Error),

    #[error("store request timed out")]
    Timeout,

    #[error("store responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("store returned an unexpected body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Transport(value)
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Telegram(RequestError),

    /// The recipient blocked the bot or no longer exists; retrying is futile.
    #[error("recipient cannot be reached: {0}")]
    Unreachable(RequestError),

    #[error("messenger call timed out")]
    Timeout,
}

impl DeliveryError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::Unreachable(_))
    }
}

impl From<RequestError> for DeliveryError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Api(
                ApiError::BotBlocked
                | ApiError::BotKicked
                | ApiError::ChatNotFound
                | ApiError::UserDeactivated,
            ) => DeliveryError::Unreachable(value),
            _ => DeliveryError::Telegram(value),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed snooze payload {0:?}")]
    Malformed(String),

    #[error("invalid reminder identity {0:?}")]
    InvalidIdentity(String),

    #[error("unknown snooze duration {0:?}")]
    UnknownDuration(String),
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("no time phrase or no task text found")]
    ParseNoMatch,

    #[error("reminder time {remind_at} is not after {now}")]
    ParsePastDate { remind_at: RemindAt, now: RemindAt },

    #[error("reminder store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("snooze protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("delivery failed: {0}")]
    DeliveryFailure(#[from] DeliveryError),
}

impl From<ValidationError> for ReminderError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::NoMatch => ReminderError::ParseNoMatch,
            ValidationError::PastDate { remind_at, now } => {
                ReminderError::ParsePastDate { remind_at, now }
            }
        }
    }
}

impl ReminderError {
    /// Message sent back to the requester for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReminderError::ParseNoMatch => INVALID_FORMAT_MESSAGE,
            ReminderError::ParsePastDate { .. } => PAST_DATE_MESSAGE,
            ReminderError::Protocol(_) => INVALID_SNOOZE_MESSAGE,
            ReminderError::StoreUnavailable(_) | ReminderError::DeliveryFailure(_) => {
                INTERNAL_FAILURE_MESSAGE
            }
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ReminderError::ParseNoMatch | ReminderError::ParsePastDate { .. }
        )
    }
}
