use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ValidationError;

pub type ReminderId = i64;
pub type SenderId = i64;

/// Absolute point in time a reminder fires at, normalized to whole seconds.
///
/// Transported and stored as RFC 3339 with an explicit offset
/// (`2024-01-02T09:00:00+01:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemindAt(DateTime<FixedOffset>);

impl RemindAt {
    pub fn new<Tz: TimeZone>(inner: DateTime<Tz>) -> Self {
        let inner = inner.fixed_offset();
        let normalized = inner.with_nanosecond(0).unwrap_or(inner);
        Self(normalized)
    }

    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(value).map(Self::new)
    }

    pub fn in_timezone<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.0.with_timezone(tz)
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Human readable form used in messages, e.g. `Tuesday, 02-Jan-24 09:00:00 CET`.
    pub fn display_in(&self, tz: &chrono_tz::Tz) -> String {
        self.in_timezone(tz)
            .format("%A, %d-%b-%y %H:%M:%S %Z")
            .to_string()
    }
}

impl fmt::Display for RemindAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for RemindAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for RemindAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        RemindAt::parse(&value).map_err(de::Error::custom)
    }
}

/// A pending reminder that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub object: String,
    pub remind_at: RemindAt,
    pub sender_id: SenderId,
}

impl Reminder {
    /// Builds a reminder, rejecting an empty task and a time that is not
    /// strictly after `now`.
    pub fn new(
        object: impl Into<String>,
        remind_at: RemindAt,
        sender_id: SenderId,
        now: RemindAt,
    ) -> Result<Self, ValidationError> {
        let object = object.into();
        if object.trim().is_empty() {
            return Err(ValidationError::NoMatch);
        }

        if remind_at <= now {
            return Err(ValidationError::PastDate { remind_at, now });
        }

        Ok(Self {
            object,
            remind_at,
            sender_id,
        })
    }
}

/// A persisted reminder whose time has come, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub id: ReminderId,
    /// Creation time as reported by the store, when it is readable.
    pub created_at: Option<DateTime<FixedOffset>>,
    pub reminder: Reminder,
}
