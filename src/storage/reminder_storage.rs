use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::reminder::{DueReminder, RemindAt, Reminder, ReminderId};

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Stores a reminder. The store-assigned id is returned when the store
    /// reports it.
    async fn insert(&self, reminder: &Reminder) -> Result<Option<ReminderId>, StoreError>;

    /// Reminders with `remind_at <= cutoff`, in insertion order.
    async fn list_due(&self, cutoff: &RemindAt) -> Result<Vec<DueReminder>, StoreError>;

    async fn delete_due(&self, cutoff: &RemindAt) -> Result<usize, StoreError>;

    async fn delete_by_ids(&self, ids: &[ReminderId]) -> Result<usize, StoreError>;
}

struct InMemoryStore {
    next_id: ReminderId,
    reminders: Vec<DueReminder>,
}

/// Process local store, used when no remote store is configured.
pub struct InMemoryReminderStore {
    store: RwLock<InMemoryStore>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        InMemoryReminderStore {
            store: RwLock::new(InMemoryStore {
                next_id: 1,
                reminders: Vec::new(),
            }),
        }
    }

    pub async fn all(&self) -> Vec<DueReminder> {
        self.store.read().await.reminders.clone()
    }
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn insert(&self, reminder: &Reminder) -> Result<Option<ReminderId>, StoreError> {
        let mut store = self.store.write().await;
        let id = store.next_id;
        store.reminders.push(DueReminder {
            id,
            created_at: Some(Utc::now().fixed_offset()),
            reminder: reminder.clone(),
        });
        store.next_id += 1;

        log::debug!("Stored reminder {id} in memory");
        Ok(Some(id))
    }

    async fn list_due(&self, cutoff: &RemindAt) -> Result<Vec<DueReminder>, StoreError> {
        let store = self.store.read().await;
        Ok(store
            .reminders
            .iter()
            .filter(|due| due.reminder.remind_at <= *cutoff)
            .cloned()
            .collect())
    }

    async fn delete_due(&self, cutoff: &RemindAt) -> Result<usize, StoreError> {
        let mut store = self.store.write().await;
        let before = store.reminders.len();
        store
            .reminders
            .retain(|due| due.reminder.remind_at > *cutoff);

        Ok(before - store.reminders.len())
    }

    async fn delete_by_ids(&self, ids: &[ReminderId]) -> Result<usize, StoreError> {
        let mut store = self.store.write().await;
        let before = store.reminders.len();
        store.reminders.retain(|due| !ids.contains(&due.id));

        Ok(before - store.reminders.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;

    use super::*;

    fn at(h: u32) -> RemindAt {
        RemindAt::new(Paris.with_ymd_and_hms(2024, 1, 2, h, 0, 0).unwrap())
    }

    fn reminder(object: &str, h: u32) -> Reminder {
        Reminder {
            object: object.to_string(),
            remind_at: at(h),
            sender_id: 42,
        }
    }

    #[tokio::test]
    async fn list_due_returns_reminders_up_to_cutoff_in_insertion_order() {
        let store = InMemoryReminderStore::new();
        store.insert(&reminder("late", 12)).await.unwrap();
        store.insert(&reminder("second", 9)).await.unwrap();
        store.insert(&reminder("first", 8)).await.unwrap();

        let due = store.list_due(&at(9)).await.unwrap();
        let objects: Vec<_> = due.iter().map(|d| d.reminder.object.as_str()).collect();

        assert_eq!(objects, ["second", "first"]);
    }

    #[tokio::test]
    async fn delete_due_keeps_future_reminders() {
        let store = InMemoryReminderStore::new();
        store.insert(&reminder("due", 9)).await.unwrap();
        store.insert(&reminder("pending", 10)).await.unwrap();

        let deleted = store.delete_due(&at(9)).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(store.list_due(&at(9)).await.unwrap().is_empty());
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_ids_only_touches_given_ids() {
        let store = InMemoryReminderStore::new();
        let first = store.insert(&reminder("a", 8)).await.unwrap().unwrap();
        let second = store.insert(&reminder("b", 8)).await.unwrap().unwrap();

        let deleted = store.delete_by_ids(&[first]).await.unwrap();

        assert_eq!(deleted, 1);
        let remaining = store.all().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
    }
}
