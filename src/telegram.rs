use std::time::Duration;

use async_trait::async_trait;
use serde::de;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, UpdateKind},
};

use crate::delivery::{Messenger, SnoozeControl};
use crate::error::DeliveryError;
use crate::interaction::InboundEvent;
use crate::reminder::SenderId;

pub struct TelegramMessenger {
    bot: Bot,
    timeout: Duration,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(
        &self,
        recipient: SenderId,
        text: &str,
        control: Option<&SnoozeControl>,
    ) -> Result<(), DeliveryError> {
        let mut request = self.bot.send_message(ChatId(recipient), text);
        if let Some(control) = control {
            request = request.reply_markup(snooze_keyboard(control));
        }

        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| DeliveryError::Timeout)??;

        Ok(())
    }

    async fn respond_to_interaction(&self, interaction_id: &str) -> Result<(), DeliveryError> {
        let request = self.bot.answer_callback_query(interaction_id.to_string());

        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| DeliveryError::Timeout)??;

        Ok(())
    }
}

fn snooze_keyboard(control: &SnoozeControl) -> InlineKeyboardMarkup {
    let buttons = control
        .options()
        .map(|(duration, payload)| InlineKeyboardButton::callback(duration.key(), payload.encode()))
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(vec![buttons])
}

/// Decodes a webhook body into an event, or `None` for updates the service
/// does not react to.
///
/// Callback queries always become events so they get acknowledged; one
/// without data carries an empty payload.
pub fn decode_update(body: &str) -> Result<Option<InboundEvent>, serde_json::Error> {
    let update: Update = serde_json::from_str(body)?;

    let event = match update.kind {
        UpdateKind::Message(msg) => msg.text().map(|text| InboundEvent::Text {
            sender_id: msg.chat.id.0,
            text: text.to_string(),
        }),
        UpdateKind::CallbackQuery(query) => {
            let sender_id = SenderId::try_from(query.from.id.0).map_err(|_| {
                <serde_json::Error as de::Error>::custom(format!(
                    "sender id {} is out of range",
                    query.from.id.0
                ))
            })?;
            if query.data.is_none() {
                log::warn!("Callback query {} from {sender_id} has no data", query.id);
            }

            Some(InboundEvent::Callback {
                sender_id,
                interaction_id: query.id,
                payload: query.data.unwrap_or_default(),
            })
        }
        other => {
            log::debug!("Ignoring update {:?}: {other:?}", update.id);
            None
        }
    };

    Ok(event)
}
