use crate::clients::telegram_client::TgUpdate;
use crate::events::queue::EventBus;
use crate::service::pipeline::PipelineEvent;

/// Maps a raw update onto a pipeline event. Only the configured chat may
/// drive the pipeline; everything else (other chats, empty texts, malformed
/// callback data) is silently ignored.
pub fn classify_update(update: &TgUpdate, allowed_chat_id: i64) -> Option<PipelineEvent> {
    if let Some(message) = &update.message {
        if message.chat.id != allowed_chat_id {
            return None;
        }
        let text = message.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        return Some(PipelineEvent::MessageReceived {
            chat_id: message.chat.id,
            text: text.to_string(),
        });
    }

    if let Some(callback) = &update.callback_query {
        let message = callback.message.as_ref()?;
        if message.chat.id != allowed_chat_id {
            return None;
        }
        let data = callback.data.as_deref()?;
        let (action, handle) = data.split_once(':')?;
        let chat_id = message.chat.id;
        let message_id = message.message_id;
        let action_id = callback.id.clone();
        let handle = handle.to_string();
        return match action {
            "confirm" => Some(PipelineEvent::ConfirmPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            }),
            "edit" => Some(PipelineEvent::EditPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            }),
            "cancel" => Some(PipelineEvent::CancelPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            }),
            "undo" => Some(PipelineEvent::UndoPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            }),
            _ => None,
        };
    }

    None
}

pub async fn route_update(bus: &EventBus, allowed_chat_id: i64, update: &TgUpdate) {
    if let Some(event) = classify_update(update, allowed_chat_id) {
        bus.emit(event).await;
    }
}
