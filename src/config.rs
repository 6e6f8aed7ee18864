use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Telegram Bot API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Public base URL the webhook is registered under. When unset the
    /// webhook is left as-is on startup.
    #[serde(default)]
    pub webhook_base_url: Option<String>,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    10
}

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8000
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite URL, or `memory` for the non-persistent store
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://whispers.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

/// Operator accounts that receive an audit copy of every whisper
#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Accepts a list (`[1, 2]`), a single id, or a comma-separated string
    /// (`"1,2"`) so the env var form `WHISPERBOT_AUDIT__OPERATOR_IDS=1,2` works.
    #[serde(default, deserialize_with = "deserialize_operator_ids")]
    pub operator_ids: Vec<i64>,
    #[serde(default = "default_audit_timeout")]
    pub timeout_secs: u64,
}

fn default_audit_timeout() -> u64 {
    5
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            operator_ids: Vec::new(),
            timeout_secs: default_audit_timeout(),
        }
    }
}

impl AuditConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OperatorIds {
    List(Vec<i64>),
    Single(i64),
    Csv(String),
}

fn deserialize_operator_ids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match OperatorIds::deserialize(deserializer)? {
        OperatorIds::List(ids) => Ok(ids),
        OperatorIds::Single(id) => Ok(vec![id]),
        OperatorIds::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid operator id: {s}")))
            })
            .collect(),
    }
}

/// Whisper lifecycle settings
#[derive(Debug, Deserialize, Clone)]
pub struct WhisperConfig {
    /// Locale used when the user's language is missing or unsupported
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Upper bound on a single private delivery attempt
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_delivery_timeout() -> u64 {
    10
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            delivery_timeout_secs: default_delivery_timeout(),
        }
    }
}

impl WhisperConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub whisper: WhisperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: WHISPERBOT_)
            // e.g., WHISPERBOT_TELEGRAM__TOKEN, WHISPERBOT_AUDIT__OPERATOR_IDS
            .add_source(
                Environment::with_prefix("WHISPERBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Helpers to build Bot API and webhook URLs with proper slash handling
impl TelegramConfig {
    /// `<api_url>/bot<token>`, the prefix every Bot API method hangs off
    pub fn bot_base_url(&self) -> String {
        format!("{}/bot{}", self.api_url.trim_end_matches('/'), self.token)
    }

    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_base_url
            .as_deref()
            .map(|base| format!("{}/webhook/{}", base.trim_end_matches('/'), self.token))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = from_toml("[telegram]\ntoken = \"123:abc\"\n").unwrap();
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.web.port, 8000);
        assert_eq!(config.database.url, "sqlite://whispers.db");
        assert!(config.audit.operator_ids.is_empty());
        assert_eq!(config.whisper.default_language, "en");
        assert_eq!(config.whisper.delivery_timeout(), Duration::from_secs(10));
        assert!(!config.logging.json);
    }

    #[test]
    fn test_operator_ids_as_list() {
        let config = from_toml(
            "[telegram]\ntoken = \"t\"\n[audit]\noperator_ids = [11, 22]\n",
        )
        .unwrap();
        assert_eq!(config.audit.operator_ids, vec![11, 22]);
    }

    #[test]
    fn test_operator_ids_as_csv_string() {
        let config = from_toml(
            "[telegram]\ntoken = \"t\"\n[audit]\noperator_ids = \"11, 22,,33\"\n",
        )
        .unwrap();
        assert_eq!(config.audit.operator_ids, vec![11, 22, 33]);
    }

    #[test]
    fn test_operator_ids_rejects_garbage() {
        let result = from_toml("[telegram]\ntoken = \"t\"\n[audit]\noperator_ids = \"11,abc\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_telegram_urls() {
        let config = TelegramConfig {
            token: "123:abc".to_string(),
            api_url: "https://api.telegram.org/".to_string(),
            webhook_base_url: Some("https://bot.example.com/".to_string()),
            timeout_secs: 10,
        };
        assert_eq!(config.bot_base_url(), "https://api.telegram.org/bot123:abc");
        assert_eq!(
            config.webhook_url().as_deref(),
            Some("https://bot.example.com/webhook/123:abc")
        );
    }

    #[test]
    fn test_memory_database_url() {
        let config = DatabaseConfig {
            url: "MEMORY".to_string(),
            ..Default::default()
        };
        assert!(config.is_memory());
        assert!(!DatabaseConfig::default().is_memory());
    }
}
