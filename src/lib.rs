pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod telegram;
pub mod web;
pub mod whisper;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
