use crate::config::TelegramConfig;
use crate::error::AppResult;
use crate::telegram::types::*;
use crate::whisper::transport::{AuditSink, PrivateMessenger, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

/// Update kinds the webhook subscribes to
pub const ALLOWED_UPDATES: &[&str] = &["message", "inline_query", "callback_query"];

/// Minimal Telegram Bot API client
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the bot token
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

/// Map a Bot API error to a transport error. 403 means the user blocked the
/// bot or never opened a private chat with it; "chat not found" is the 400
/// variant of the same condition.
fn classify_api_error(error_code: Option<i32>, description: Option<String>) -> TransportError {
    let description = description.unwrap_or_else(|| "unknown error".to_string());
    let unreachable = error_code == Some(403)
        || (error_code == Some(400) && description.to_lowercase().contains("chat not found"));

    if unreachable {
        TransportError::Unreachable(description)
    } else {
        TransportError::Request(match error_code {
            Some(code) => format!("{}: {}", code, description),
            None => description,
        })
    }
}

/// The request URL embeds the bot token, so it is stripped before the error
/// is rendered.
fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(e.without_url().to_string())
    }
}

impl TelegramClient {
    /// Create a new Bot API client from config
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: config.bot_base_url(),
        })
    }

    /// Call a Bot API method and unwrap the `{ok, result}` envelope
    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, TransportError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        debug!("Calling Bot API method {}", method);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body: ApiResponse<Res> = response.json().await.map_err(|e| {
            error!("Failed to parse {} response (status {}): {}", method, status, e);
            request_error(e)
        })?;

        if !body.ok {
            return Err(classify_api_error(body.error_code, body.description));
        }

        body.result
            .ok_or_else(|| TransportError::Request(format!("{} returned no result", method)))
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TransportError> {
        self.call("sendMessage", &SendMessageRequest { chat_id, text }).await
    }

    pub async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: &[InlineQueryResultArticle],
    ) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerInlineQuery",
                &AnswerInlineQueryRequest {
                    inline_query_id,
                    results,
                    cache_time: 1,
                    is_personal: true,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest {
                    callback_query_id,
                    text,
                    show_alert,
                },
            )
            .await?;
        Ok(())
    }

    /// Register the webhook URL with Telegram
    pub async fn set_webhook(&self, url: &str) -> AppResult<()> {
        let _: bool = self
            .call(
                "setWebhook",
                &SetWebhookRequest {
                    url,
                    allowed_updates: ALLOWED_UPDATES,
                },
            )
            .await?;
        info!("Webhook registered");
        Ok(())
    }
}

#[async_trait]
impl PrivateMessenger for TelegramClient {
    async fn send_private_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

#[async_trait]
impl AuditSink for TelegramClient {
    async fn notify(&self, operator_id: i64, text: &str) -> Result<(), TransportError> {
        self.send_message(operator_id, text).await.map(|_| ())
    }
}
