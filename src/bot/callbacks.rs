use crate::bot::{Bot, Locale};
use crate::db::WhisperId;
use crate::error::AppResult;
use crate::telegram::types::{CallbackQuery, User};
use crate::whisper::{Actor, RevealOutcome};
use tracing::{debug, error};

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Callback acknowledgment shown to the user who pressed the button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub text: String,
    pub show_alert: bool,
}

/// Map a reveal result to the acknowledgment text
pub fn acknowledgment(result: &AppResult<RevealOutcome>, locale: Locale) -> Acknowledgment {
    let strings = locale.strings();
    let (text, show_alert) = match result {
        Ok(RevealOutcome::Delivered { .. }) => (strings.secret_sent.to_string(), false),
        Ok(RevealOutcome::NotFound) => (strings.not_found.to_string(), true),
        Ok(RevealOutcome::Forbidden { target_username }) => {
            (locale.not_for_you(target_username), true)
        }
        Ok(RevealOutcome::AlreadyOpened) => (strings.already_opened.to_string(), true),
        Ok(RevealOutcome::DeliveryFailed) => (strings.start_dm_first.to_string(), true),
        Err(_) => (strings.unavailable.to_string(), true),
    };
    Acknowledgment { text, show_alert }
}

/// Handle a press of the "show message" button
pub async fn handle_show_whisper(bot: &Bot, callback: &CallbackQuery) {
    let Some(id) = callback.data.as_deref().and_then(WhisperId::from_reveal_token) else {
        debug!("Ignoring callback query {} with foreign data", callback.id);
        return;
    };

    let locale = bot.locale_for(callback.from.language_code.as_deref());
    let actor = Actor::from(&callback.from);

    let result = bot.authorizer.reveal(&id, &actor).await;
    if let Err(e) = &result {
        error!("Reveal of whisper {} by {} failed: {}", id, actor.id, e);
    }

    let ack = acknowledgment(&result, locale);
    if let Err(e) = bot
        .api
        .answer_callback_query(&callback.id, Some(&ack.text), ack.show_alert)
        .await
    {
        error!("Failed to answer callback query {}: {}", callback.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_delivered_is_a_toast() {
        let ack = acknowledgment(&Ok(RevealOutcome::Delivered { first_reveal: true }), Locale::English);
        assert_eq!(ack.text, "Secret sent to your DM 🔐");
        assert!(!ack.show_alert);
    }

    #[test]
    fn test_forbidden_names_target() {
        let ack = acknowledgment(
            &Ok(RevealOutcome::Forbidden {
                target_username: "alice".to_string(),
            }),
            Locale::English,
        );
        assert_eq!(ack.text, "This whisper is only for @alice");
        assert!(ack.show_alert);
    }

    #[test]
    fn test_failure_alerts() {
        let cases = [
            (Ok(RevealOutcome::NotFound), "Whisper not found or expired"),
            (Ok(RevealOutcome::DeliveryFailed), "Please start a DM with me first"),
            (Ok(RevealOutcome::AlreadyOpened), "This whisper has already been opened"),
            (
                Err(AppError::Database(sqlx::Error::PoolTimedOut)),
                "Something went wrong, please try again later",
            ),
        ];
        for (result, expected) in cases {
            let ack = acknowledgment(&result, Locale::English);
            assert_eq!(ack.text, expected);
            assert!(ack.show_alert);
        }
    }

    #[test]
    fn test_actor_from_user() {
        let user = User {
            id: 4,
            is_bot: false,
            first_name: "Alice".to_string(),
            last_name: None,
            username: Some("Alice".to_string()),
            language_code: Some("en".to_string()),
        };
        assert_eq!(
            Actor::from(&user),
            Actor {
                id: 4,
                username: Some("Alice".to_string())
            }
        );
    }
}
