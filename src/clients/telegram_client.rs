use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::service::chat_service::ChatAction;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_SECONDS: u64 = 30;
// Above the long-poll window so the server side times out first.
const REQUEST_TIMEOUT_SECONDS: u64 = 40;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    #[serde(default)]
    pub chat: TgChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TgCallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub async fn get_updates(
    token: &str,
    offset: i64,
) -> Result<Vec<TgUpdate>, Box<dyn std::error::Error + Send + Sync>> {
    let url = format!("{}/bot{}/getUpdates", TELEGRAM_API_BASE, token);
    let response = client()?
        .get(&url)
        .query(&[
            ("offset", offset.to_string()),
            ("timeout", LONG_POLL_SECONDS.to_string()),
        ])
        .send()
        .await?;
    read_result::<Vec<TgUpdate>>(response).await
}

pub async fn send_message(
    token: &str,
    chat_id: i64,
    text: &str,
    actions: &[ChatAction],
) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
    let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, token);
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if !actions.is_empty() {
        body["reply_markup"] = inline_keyboard(actions);
    }
    let response = client()?.post(&url).json(&body).send().await?;
    let message = read_result::<TgMessage>(response).await?;
    Ok(message.message_id)
}

pub async fn edit_message(
    token: &str,
    chat_id: i64,
    message_id: i64,
    text: &str,
    actions: &[ChatAction],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let url = format!("{}/bot{}/editMessageText", TELEGRAM_API_BASE, token);
    let mut body = json!({
        "chat_id": chat_id,
        "message_id": message_id,
        "text": text,
    });
    if !actions.is_empty() {
        body["reply_markup"] = inline_keyboard(actions);
    }
    let response = client()?.post(&url).json(&body).send().await?;
    // The API returns either the edited message or `true`; only the status
    // matters here.
    let _ = read_result::<serde_json::Value>(response).await?;
    Ok(())
}

pub async fn answer_callback(
    token: &str,
    callback_id: &str,
    text: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let url = format!("{}/bot{}/answerCallbackQuery", TELEGRAM_API_BASE, token);
    let mut body = json!({ "callback_query_id": callback_id });
    if !text.is_empty() {
        body["text"] = json!(text);
    }
    let response = client()?.post(&url).json(&body).send().await?;
    let _ = read_result::<serde_json::Value>(response).await?;
    Ok(())
}

fn inline_keyboard(actions: &[ChatAction]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = actions
        .iter()
        .map(|action| json!([{ "text": action.label, "callback_data": action.data }]))
        .collect();
    json!({ "inline_keyboard": rows })
}

fn client() -> Result<reqwest::Client, Box<dyn std::error::Error + Send + Sync>> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
        .build()?)
}

async fn read_result<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(format!("Telegram request failed with status {}: {}", status, text).into());
    }
    let parsed: TgResponse<T> = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse Telegram response: {}\nRaw body: {}", e, text))?;
    if !parsed.ok {
        return Err(format!(
            "Telegram API error: {}",
            parsed.description.unwrap_or_else(|| "unknown".to_string())
        )
        .into());
    }
    parsed
        .result
        .ok_or_else(|| "No result in Telegram response".to_string().into())
}
