use std::sync::Arc;

use crate::clients::telegram_client;
use crate::config::Settings;
use crate::events::queue::EventBus;
use crate::events::worker::run_event_worker;
use crate::handlers::telegram;
use crate::service::calendar_service::{CalendarService, GoogleCalendarService};
use crate::service::chat_service::{ChatService, TelegramChatService};
use crate::service::clock::{Clock, SystemClock, TimerScheduler, TokioScheduler};
use crate::service::openai_service::{OpenAIClient, OpenAIService};
use crate::service::pipeline::PipelineEngine;

const EVENT_BUS_BUFFER: usize = 64;
const POLL_RETRY_SECONDS: u64 = 5;

pub async fn run_bot(settings: Settings) {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler: Arc<dyn TimerScheduler> = Arc::new(TokioScheduler);
    let openai: Arc<dyn OpenAIClient> =
        Arc::new(OpenAIService::new(settings.openai_api_key.clone()));
    let calendar: Arc<dyn CalendarService> =
        Arc::new(GoogleCalendarService::new(settings.google_access_token.clone()));
    let chat: Arc<dyn ChatService> =
        Arc::new(TelegramChatService::new(settings.telegram_token.clone()));

    let engine = PipelineEngine::new(openai, calendar, chat, clock, scheduler, settings.clone());

    let (bus, rx) = EventBus::new(EVENT_BUS_BUFFER);
    tokio::spawn(run_event_worker(rx, engine));

    println!("agendaBot connected, polling updates...");
    let mut offset: i64 = 0;
    loop {
        match telegram_client::get_updates(&settings.telegram_token, offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    telegram::route_update(&bus, settings.allowed_chat_id, &update).await;
                }
            }
            Err(err) => {
                eprintln!("Failed to poll Telegram updates: {}", err);
                tokio::time::sleep(std::time::Duration::from_secs(POLL_RETRY_SECONDS)).await;
            }
        }
    }
}
