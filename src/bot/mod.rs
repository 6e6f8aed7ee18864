pub mod callbacks;
pub mod handler;
pub mod inline;
pub mod locale;

pub use locale::Locale;

use crate::config::AppConfig;
use crate::db::WhisperStore;
use crate::telegram::TelegramClient;
use crate::whisper::{AuditNotifier, DisclosureAuthorizer, WhisperService};
use std::sync::Arc;
use tracing::warn;

/// Shared state for all update handlers
#[derive(Debug)]
pub struct Bot {
    pub api: Arc<TelegramClient>,
    pub service: WhisperService,
    pub authorizer: DisclosureAuthorizer,
    pub default_locale: Locale,
}

impl Bot {
    /// Wire the whisper core to the Telegram client. The client doubles as
    /// the private messenger and the audit sink.
    pub fn new(api: Arc<TelegramClient>, store: Arc<dyn WhisperStore>, config: &AppConfig) -> Self {
        let audit = AuditNotifier::new(api.clone(), &config.audit);
        let service = WhisperService::new(store.clone(), audit);
        let authorizer =
            DisclosureAuthorizer::new(store, api.clone(), config.whisper.delivery_timeout());

        let default_locale = Locale::from_code(&config.whisper.default_language).unwrap_or_else(|| {
            warn!(
                "Unsupported default language '{}', falling back to English",
                config.whisper.default_language
            );
            Locale::default()
        });

        Self {
            api,
            service,
            authorizer,
            default_locale,
        }
    }

    /// Locale for a user, falling back to the configured default
    pub fn locale_for(&self, language_code: Option<&str>) -> Locale {
        Locale::resolve(language_code, self.default_locale)
    }
}
