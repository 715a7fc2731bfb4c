use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::reminder::{DueReminder, RemindAt, Reminder, ReminderId, SenderId};

/// Writable columns of the `Reminder` collection.
#[derive(Debug, Serialize)]
pub(super) struct InsertReminderModel<'a> {
    pub object: &'a str,
    pub remind_date: RemindAt,
    pub sender_id: SenderId,
}

impl<'a> From<&'a Reminder> for InsertReminderModel<'a> {
    fn from(value: &'a Reminder) -> Self {
        Self {
            object: &value.object,
            remind_date: value.remind_at,
            sender_id: value.sender_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct InsertedRow {
    #[serde(default)]
    pub id: Option<ReminderId>,
}

/// Whatever the store echoes back after an insert: a list of rows or a
/// single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum InsertedRepresentation {
    Rows(Vec<InsertedRow>),
    Row(InsertedRow),
}

impl InsertedRepresentation {
    pub fn id(&self) -> Option<ReminderId> {
        match self {
            InsertedRepresentation::Rows(rows) => rows.first().and_then(|row| row.id),
            InsertedRepresentation::Row(row) => row.id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReminderStorageModel {
    pub id: ReminderId,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<FixedOffset>>,
    pub object: String,
    pub remind_date: RemindAt,
    pub sender_id: SenderId,
}

impl From<ReminderStorageModel> for DueReminder {
    fn from(value: ReminderStorageModel) -> Self {
        Self {
            id: value.id,
            created_at: value.created_at,
            reminder: Reminder {
                object: value.object,
                remind_at: value.remind_date,
                sender_id: value.sender_id,
            },
        }
    }
}

/// Accepts RFC 3339 and offset-less timestamps (read as UTC); anything else
/// becomes `None`.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(&value).ok().or_else(|| {
        NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    });
    if parsed.is_none() {
        log::warn!("Ignoring unreadable created_at {value:?}");
    }

    Ok(parsed)
}
