/// Supported interface languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    English,
    Hindi,
}

/// User-facing strings for one locale. `{target_username}` is substituted by
/// the helpers on [`Locale`].
#[derive(Debug)]
pub struct Strings {
    pub usage: &'static str,
    pub usage_title: &'static str,
    pub empty_title: &'static str,
    pub empty_description: &'static str,
    pub whisper_title: &'static str,
    pub whisper_description: &'static str,
    pub whisper_placeholder: &'static str,
    pub show_message: &'static str,
    pub secret_sent: &'static str,
    pub not_for_you: &'static str,
    pub not_found: &'static str,
    pub already_opened: &'static str,
    pub start_dm_first: &'static str,
    pub unavailable: &'static str,
    pub welcome: &'static str,
}

static ENGLISH: Strings = Strings {
    usage: "Usage: @BotUsername secret_text @username",
    usage_title: "Whisper Bot Usage",
    empty_title: "Empty Message",
    empty_description: "Please provide a secret message",
    whisper_title: "Whisper to @{target_username}",
    whisper_description: "Click to send whisper",
    whisper_placeholder: "🔒 A whisper message to @{target_username}. Only they can open it.",
    show_message: "show message 🔒",
    secret_sent: "Secret sent to your DM 🔐",
    not_for_you: "This whisper is only for @{target_username}",
    not_found: "Whisper not found or expired",
    already_opened: "This whisper has already been opened",
    start_dm_first: "Please start a DM with me first",
    unavailable: "Something went wrong, please try again later",
    welcome: "🤫 Welcome to Whisper Bot!\n\n\
              Send secret messages in any chat using inline mode:\n\n\
              Type: @BotUsername your_message @target_user\n\n\
              Example: @BotUsername Hello, this is secret! @username",
};

static HINDI: Strings = Strings {
    usage: "उपयोग: @BotUsername गुप्त_संदेश @username",
    usage_title: "व्हिस्पर बॉट का उपयोग",
    empty_title: "खाली संदेश",
    empty_description: "कृपया एक गुप्त संदेश लिखें",
    whisper_title: "@{target_username} को व्हिस्पर",
    whisper_description: "व्हिस्पर भेजने के लिए क्लिक करें",
    whisper_placeholder: "🔒 @{target_username} को एक गुप्त संदेश। केवल वे इसे खोल सकते हैं।",
    show_message: "संदेश दिखाएं 🔒",
    secret_sent: "आपके DM में संदेश भेज दिया गया है 🔐",
    not_for_you: "यह संदेश केवल @{target_username} के लिए है",
    not_found: "संदेश नहीं मिला या समाप्त हो गया",
    already_opened: "यह संदेश पहले ही खोला जा चुका है",
    start_dm_first: "कृपया पहले मुझसे DM शुरू करें",
    unavailable: "कुछ गलत हो गया, कृपया बाद में पुनः प्रयास करें",
    welcome: "🤫 व्हिस्पर बॉट में आपका स्वागत है!\n\n\
              इनलाइन मोड से किसी भी चैट में गुप्त संदेश भेजें:\n\n\
              लिखें: @BotUsername आपका_संदेश @target_user",
};

impl Locale {
    /// Parse a language code; regional variants (`en-US`, `hi_IN`) map to
    /// their base language
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_lowercase();
        let base_code = code.split(|c| c == '_' || c == '-').next()?;

        match base_code {
            "en" => Some(Self::English),
            "hi" => Some(Self::Hindi),
            _ => None,
        }
    }

    /// The user's locale if supported, otherwise `default`
    pub fn resolve(user_code: Option<&str>, default: Locale) -> Self {
        user_code.and_then(Self::from_code).unwrap_or(default)
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Self::English => &ENGLISH,
            Self::Hindi => &HINDI,
        }
    }

    pub fn whisper_title(&self, target_username: &str) -> String {
        fill(self.strings().whisper_title, target_username)
    }

    pub fn whisper_placeholder(&self, target_username: &str) -> String {
        fill(self.strings().whisper_placeholder, target_username)
    }

    pub fn not_for_you(&self, target_username: &str) -> String {
        fill(self.strings().not_for_you, target_username)
    }
}

fn fill(template: &str, target_username: &str) -> String {
    template.replace("{target_username}", target_username)
}
