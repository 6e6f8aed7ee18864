pub mod client;
pub mod types;

pub use client::{TelegramClient, ALLOWED_UPDATES};
pub use types::{CallbackQuery, InlineQuery, InlineQueryResultArticle, Message, Update, User};
