use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::{Europe::Paris, Tz};
use teloxide::{ApiError, RequestError};

use crate::clock::Clock;
use crate::delivery::{Messenger, SnoozeControl};
use crate::error::{DeliveryError, StoreError};
use crate::reminder::{DueReminder, RemindAt, Reminder, ReminderId, SenderId};
use crate::storage::{InMemoryReminderStore, ReminderStore};

pub fn paris(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
    Paris.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub struct FixedClock(pub DateTime<Tz>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}

/// In-memory store that records which calls reached it.
pub struct CountingStore {
    pub inner: InMemoryReminderStore,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
    purge_cutoffs: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryReminderStore::new(),
            inserts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            purge_cutoffs: Mutex::new(Vec::new()),
        }
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn purge_cutoffs(&self) -> Vec<String> {
        self.purge_cutoffs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderStore for CountingStore {
    async fn insert(&self, reminder: &Reminder) -> Result<Option<ReminderId>, StoreError> {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.inner.insert(reminder).await
    }

    async fn list_due(&self, cutoff: &RemindAt) -> Result<Vec<DueReminder>, StoreError> {
        self.inner.list_due(cutoff).await
    }

    async fn delete_due(&self, cutoff: &RemindAt) -> Result<usize, StoreError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.purge_cutoffs.lock().unwrap().push(cutoff.to_rfc3339());
        self.inner.delete_due(cutoff).await
    }

    async fn delete_by_ids(&self, ids: &[ReminderId]) -> Result<usize, StoreError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.inner.delete_by_ids(ids).await
    }
}

/// Store that behaves like an unreachable backend.
pub struct FailingStore;

#[async_trait]
impl ReminderStore for FailingStore {
    async fn insert(&self, _reminder: &Reminder) -> Result<Option<ReminderId>, StoreError> {
        Err(StoreError::Timeout)
    }

    async fn list_due(&self, _cutoff: &RemindAt) -> Result<Vec<DueReminder>, StoreError> {
        Err(StoreError::Timeout)
    }

    async fn delete_due(&self, _cutoff: &RemindAt) -> Result<usize, StoreError> {
        Err(StoreError::Timeout)
    }

    async fn delete_by_ids(&self, _ids: &[ReminderId]) -> Result<usize, StoreError> {
        Err(StoreError::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: SenderId,
    pub text: String,
    pub control: Option<SnoozeControl>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    acknowledged: Mutex<Vec<String>>,
    failing_recipients: Vec<SenderId>,
    unreachable_recipients: Vec<SenderId>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends to these recipients time out.
    pub fn failing_for(recipients: &[SenderId]) -> Self {
        Self {
            failing_recipients: recipients.to_vec(),
            ..Self::default()
        }
    }

    /// Sends to these recipients fail as if they blocked the bot.
    pub fn unreachable_for(recipients: &[SenderId]) -> Self {
        Self {
            unreachable_recipients: recipients.to_vec(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        recipient: SenderId,
        text: &str,
        control: Option<&SnoozeControl>,
    ) -> Result<(), DeliveryError> {
        if self.failing_recipients.contains(&recipient) {
            return Err(DeliveryError::Timeout);
        }
        if self.unreachable_recipients.contains(&recipient) {
            return Err(RequestError::Api(ApiError::BotBlocked).into());
        }

        self.sent.lock().unwrap().push(SentMessage {
            recipient,
            text: text.to_string(),
            control: control.cloned(),
        });
        Ok(())
    }

    async fn respond_to_interaction(&self, interaction_id: &str) -> Result<(), DeliveryError> {
        self.acknowledged
            .lock()
            .unwrap()
            .push(interaction_id.to_string());
        Ok(())
    }
}
