use crate::bot::{callbacks, inline, Bot};
use crate::telegram::types::{Message, Update};
use tracing::{debug, error, info};

/// Route a webhook update to its handler
pub async fn handle_update(bot: &Bot, update: Update) {
    if let Some(query) = &update.inline_query {
        inline::handle_inline_query(bot, query).await;
    } else if let Some(callback) = &update.callback_query {
        callbacks::handle_show_whisper(bot, callback).await;
    } else if let Some(message) = &update.message {
        handle_message(bot, message).await;
    } else {
        debug!("Ignoring update {} with no handled payload", update.update_id);
    }
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

/// Reply to `/start` in a private chat with the welcome text
async fn handle_message(bot: &Bot, message: &Message) {
    if !message.chat.is_private() {
        return;
    }

    let Some(text) = message.text.as_deref() else {
        return;
    };

    if !is_start_command(text) {
        return;
    }

    let language_code = message
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_deref());
    let locale = bot.locale_for(language_code);

    info!("New private chat with {}", message.chat.id);
    if let Err(e) = bot
        .api
        .send_message(message.chat.id, locale.strings().welcome)
        .await
    {
        error!("Failed to send welcome message to {}: {}", message.chat.id, e);
    }
}
