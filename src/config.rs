use std::collections::HashMap;
use std::fs;

pub const DEFAULT_UNDO_WINDOW_SECONDS: i64 = 120;
pub const DEFAULT_PREVIEW_TTL_SECONDS: i64 = 300;
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;
pub const DEFAULT_CALENDAR_ID: &str = "primary";

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Resolved runtime settings. Credentials are required up front; tuning
/// knobs fall back to the documented defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub openai_api_key: String,
    pub google_access_token: String,
    pub allowed_chat_id: i64,
    pub calendar_id: String,
    pub owner_email: String,
    pub undo_window_seconds: i64,
    pub preview_ttl_seconds: i64,
    pub default_duration_minutes: i64,
}

impl Settings {
    pub fn from_props<F>(get_prop: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token = get_prop("TELEGRAM_BOT_TOKEN")
            .expect("TELEGRAM_BOT_TOKEN must be set for bot mode");
        let allowed_chat_id = get_prop("ALLOWED_CHAT_ID")
            .expect("ALLOWED_CHAT_ID must be set for bot mode")
            .parse::<i64>()
            .expect("ALLOWED_CHAT_ID must be a numeric chat id");
        Self::shared(get_prop, telegram_token, allowed_chat_id)
    }

    /// Console mode drives the pipeline locally and never touches Telegram.
    pub fn from_props_console<F>(get_prop: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::shared(get_prop, String::new(), 0)
    }

    fn shared<F>(get_prop: &F, telegram_token: String, allowed_chat_id: i64) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = get_prop("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY environment variable not set");
        let google_access_token = get_prop("GOOGLE_ACCESS_TOKEN")
            .expect("GOOGLE_ACCESS_TOKEN environment variable not set");
        let owner_email = get_prop("OWNER_EMAIL")
            .expect("OWNER_EMAIL environment variable not set");

        Self {
            telegram_token,
            openai_api_key,
            google_access_token,
            allowed_chat_id,
            calendar_id: get_prop("GOOGLE_CALENDAR_ID")
                .unwrap_or(DEFAULT_CALENDAR_ID.to_string()),
            owner_email,
            undo_window_seconds: parse_or(get_prop("UNDO_WINDOW_SECONDS"), DEFAULT_UNDO_WINDOW_SECONDS),
            preview_ttl_seconds: parse_or(get_prop("PREVIEW_TTL_SECONDS"), DEFAULT_PREVIEW_TTL_SECONDS),
            default_duration_minutes: parse_or(
                get_prop("DEFAULT_EVENT_DURATION_MINUTES"),
                DEFAULT_EVENT_DURATION_MINUTES,
            ),
        }
    }
}

fn parse_or(value: Option<String>, default: i64) -> i64 {
    value.and_then(|v| v.parse::<i64>().ok()).unwrap_or(default)
}
