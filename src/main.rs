use std::sync::Arc;
use std::time::Duration;

use nudge::{
    appsettings::AppSettings,
    clock::{Clock, SystemClock},
    delivery::Messenger,
    dispatch::NotificationDispatcher,
    interaction::InteractionHandler,
    lifecycle::ReminderLifecycleManager,
    scheduling::SweepTicker,
    server::{self, TriggerState},
    storage::{InMemoryReminderStore, ReminderStore, RestReminderStore},
    telegram::TelegramMessenger,
    time_expression::EnglishTimeParser,
};
use teloxide::Bot;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let settings = AppSettings::load()?;
    log::info!("Starting with timezone {}", settings.timezone);

    let store: Arc<dyn ReminderStore> = match &settings.store {
        Some(store_settings) => Arc::new(RestReminderStore::new(store_settings)?),
        None => {
            log::warn!("No store configured, reminders are kept in memory only");
            Arc::new(InMemoryReminderStore::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(settings.timezone));
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(
        Bot::new(&settings.telegram.token),
        Duration::from_secs(settings.messenger.timeout_secs),
    ));
    let lifecycle = Arc::new(ReminderLifecycleManager::new(
        store,
        Arc::new(EnglishTimeParser),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        lifecycle.clone(),
        messenger.clone(),
        settings.sweep.purge_policy,
    ));
    let interactions = Arc::new(InteractionHandler::new(
        lifecycle,
        messenger,
        clock.clone(),
    ));

    let cancellation_token = CancellationToken::new();
    let ticker = (settings.sweep.interval_secs > 0).then(|| {
        SweepTicker::spawn(
            dispatcher.clone(),
            clock.clone(),
            Duration::from_secs(settings.sweep.interval_secs),
            &cancellation_token,
        )
    });

    tokio::spawn({
        let cancellation_token = cancellation_token.clone();
        async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                log::error!("Could not listen for shutdown signal: {error}");
            }
            log::info!("Shutting down");
            cancellation_token.cancel();
        }
    });

    let state = TriggerState {
        dispatcher,
        interactions,
        clock,
    };
    let served = server::serve(&settings.server.bind, state, cancellation_token.clone()).await;

    cancellation_token.cancel();
    if let Some(ticker) = ticker {
        ticker.cancel(SHUTDOWN_TIMEOUT).await;
    }

    served
}
