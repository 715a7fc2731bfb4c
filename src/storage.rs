mod model;
mod reminder_storage;
mod rest;

pub use reminder_storage::{InMemoryReminderStore, ReminderStore};
pub use rest::RestReminderStore;
