use crate::bot::{Bot, Locale};
use crate::db::Sender;
use crate::telegram::types::{InlineKeyboardMarkup, InlineQuery, InlineQueryResultArticle, User};
use crate::whisper::{ParseError, Submission, WhisperArtifact};
use tracing::error;

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            last_name: user.last_name.clone(),
        }
    }
}

/// Platform-facing placeholder for a created whisper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub title: String,
    pub text: String,
    pub reveal_token: String,
}

impl Placeholder {
    pub fn new(artifact: &WhisperArtifact, locale: Locale) -> Self {
        Self {
            title: locale.whisper_title(&artifact.target_username),
            text: locale.whisper_placeholder(&artifact.target_username),
            reveal_token: artifact.reveal_token(),
        }
    }
}

/// Build the inline answer for a submission
pub fn submission_article(submission: &Submission, locale: Locale) -> InlineQueryResultArticle {
    let strings = locale.strings();
    match submission {
        Submission::Created(artifact) => {
            let placeholder = Placeholder::new(artifact, locale);
            InlineQueryResultArticle::new(
                artifact.id.as_str(),
                placeholder.title,
                strings.whisper_description,
                placeholder.text,
            )
            .with_markup(InlineKeyboardMarkup::single_button(
                strings.show_message,
                placeholder.reveal_token,
            ))
        }
        Submission::Rejected(ParseError::NoAddressee) => {
            InlineQueryResultArticle::new("help", strings.usage_title, strings.usage, strings.usage)
        }
        Submission::Rejected(ParseError::EmptyBody) => InlineQueryResultArticle::new(
            "error",
            strings.empty_title,
            strings.empty_description,
            strings.usage,
        ),
    }
}

/// Handle an inline query: create the whisper and offer the placeholder
pub async fn handle_inline_query(bot: &Bot, query: &InlineQuery) {
    let locale = bot.locale_for(query.from.language_code.as_deref());
    let sender = Sender::from(&query.from);

    let article = match bot.service.submit(&query.query, &sender).await {
        Ok(submission) => submission_article(&submission, locale),
        Err(e) => {
            error!("Failed to create whisper for inline query {}: {}", query.id, e);
            let strings = locale.strings();
            InlineQueryResultArticle::new(
                "unavailable",
                strings.unavailable,
                strings.unavailable,
                strings.unavailable,
            )
        }
    };

    if let Err(e) = bot.api.answer_inline_query(&query.id, &[article]).await {
        error!("Failed to answer inline query {}: {}", query.id, e);
    }
}
