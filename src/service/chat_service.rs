use async_trait::async_trait;

use crate::clients::telegram_client;

/// One inline action attached to a message. `data` is the opaque callback
/// payload echoed back when the user presses the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAction {
    pub label: String,
    pub data: String,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends a message with optional actions and returns the message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<i64, String>;

    /// Replaces an existing message's text and actions.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<(), String>;

    /// Acknowledges a pressed action so the client stops its spinner.
    async fn answer_action(&self, action_id: &str, text: &str) -> Result<(), String>;
}

pub struct TelegramChatService {
    token: String,
}

impl TelegramChatService {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl ChatService for TelegramChatService {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<i64, String> {
        telegram_client::send_message(&self.token, chat_id, text, actions)
            .await
            .map_err(|err| format!("Failed to send Telegram message: {}", err))
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<(), String> {
        telegram_client::edit_message(&self.token, chat_id, message_id, text, actions)
            .await
            .map_err(|err| format!("Failed to edit Telegram message: {}", err))
    }

    async fn answer_action(&self, action_id: &str, text: &str) -> Result<(), String> {
        telegram_client::answer_callback(&self.token, action_id, text)
            .await
            .map_err(|err| format!("Failed to answer Telegram callback: {}", err))
    }
}
