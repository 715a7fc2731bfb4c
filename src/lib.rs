pub mod appsettings;
pub mod clock;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod interaction;
pub mod lifecycle;
pub mod reminder;
pub mod scheduling;
pub mod server;
pub mod snooze;
pub mod storage;
pub mod telegram;
pub mod time_expression;

#[cfg(test)]
mod test_utils;
