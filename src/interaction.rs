use std::sync::Arc;

use teloxide::utils::command::BotCommands;

use crate::clock::Clock;
use crate::delivery::{Messenger, USAGE_TEXT, confirmation_text};
use crate::error::ReminderError;
use crate::lifecycle::ReminderLifecycleManager;
use crate::reminder::SenderId;
use crate::snooze::SnoozeProtocolHandler;

/// An inbound event from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text {
        sender_id: SenderId,
        text: String,
    },
    Callback {
        sender_id: SenderId,
        interaction_id: String,
        payload: String,
    },
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum GlobalCommand {
    #[command(description = "show how to create a reminder.")]
    Start,
    #[command(description = "show this help.")]
    Help,
}

/// Routes inbound events to reminder creation or the snooze protocol.
pub struct InteractionHandler {
    lifecycle: Arc<ReminderLifecycleManager>,
    snooze: SnoozeProtocolHandler,
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
}

impl InteractionHandler {
    pub fn new(
        lifecycle: Arc<ReminderLifecycleManager>,
        messenger: Arc<dyn Messenger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let snooze = SnoozeProtocolHandler::new(lifecycle.clone(), messenger.clone());

        Self {
            lifecycle,
            snooze,
            messenger,
            clock,
        }
    }

    pub async fn handle(&self, event: InboundEvent) -> Result<(), ReminderError> {
        match event {
            InboundEvent::Text { sender_id, text } => self.handle_text(sender_id, &text).await,
            InboundEvent::Callback {
                sender_id,
                interaction_id,
                payload,
            } => self
                .snooze
                .handle(sender_id, &interaction_id, &payload, self.clock.now())
                .await
                .map(|_| ()),
        }
    }

    async fn handle_text(&self, sender_id: SenderId, text: &str) -> Result<(), ReminderError> {
        if let Ok(command) = GlobalCommand::parse(text, "") {
            let reply = match command {
                GlobalCommand::Start => USAGE_TEXT.to_string(),
                GlobalCommand::Help => {
                    format!("{}\n\n{USAGE_TEXT}", GlobalCommand::descriptions())
                }
            };
            self.messenger.send(sender_id, &reply, None).await?;
            return Ok(());
        }

        let now = self.clock.now();
        let outcome = self.lifecycle.create_from_text(text, sender_id, now).await;

        let reply = match &outcome {
            Ok(reminder) => confirmation_text(reminder, &now.timezone()),
            Err(error) if error.is_user_error() => {
                log::info!("Rejected reminder {text:?} from {sender_id}: {error}");
                error.user_message().to_string()
            }
            Err(error) => {
                log::error!("Could not create reminder {text:?} from {sender_id}: {error}");
                error.user_message().to_string()
            }
        };

        self.messenger.send(sender_id, &reply, None).await?;
        outcome.map(|_| ())
    }
}
