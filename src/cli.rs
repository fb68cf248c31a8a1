use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};

use crate::config::Settings;
use crate::service::calendar_service::{CalendarService, GoogleCalendarService};
use crate::service::chat_service::{ChatAction, ChatService};
use crate::service::clock::{Clock, SystemClock, TimerScheduler, TokioScheduler};
use crate::service::openai_service::{OpenAIClient, OpenAIService};
use crate::service::pipeline::{PipelineEngine, PipelineEvent};

const CONSOLE_CHAT_ID: i64 = 0;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one message through the pipeline and print the preview.
    Message { text: String },
    /// Interactive session: type requests and drive the preview actions.
    Prompt {},
}

pub async fn cli(settings: Settings) {
    // Fine to panic here
    let cli = Cli::parse();

    let console = Arc::new(ConsoleChatService::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler: Arc<dyn TimerScheduler> = Arc::new(TokioScheduler);
    let openai: Arc<dyn OpenAIClient> =
        Arc::new(OpenAIService::new(settings.openai_api_key.clone()));
    let calendar: Arc<dyn CalendarService> =
        Arc::new(GoogleCalendarService::new(settings.google_access_token.clone()));
    let chat: Arc<dyn ChatService> = console.clone();

    let engine = PipelineEngine::new(openai, calendar, chat, clock, scheduler, settings);

    match &cli.command {
        Commands::Message { text } => {
            engine
                .handle_event(PipelineEvent::MessageReceived {
                    chat_id: CONSOLE_CHAT_ID,
                    text: text.clone(),
                })
                .await;
        }
        Commands::Prompt {} => {
            interactive(&engine, &console).await;
        }
    }
}

async fn interactive(engine: &PipelineEngine, console: &ConsoleChatService) {
    loop {
        let Ok(text) = Text::new("O que devo agendar?").prompt() else {
            return;
        };
        if text.trim().is_empty() {
            continue;
        }
        engine
            .handle_event(PipelineEvent::MessageReceived {
                chat_id: CONSOLE_CHAT_ID,
                text,
            })
            .await;

        loop {
            let offered = console.take_offered();
            if offered.is_empty() {
                break;
            }
            let mut labels: Vec<String> =
                offered.iter().map(|action| action.label.clone()).collect();
            labels.push("(voltar)".to_string());
            let Ok(choice) = Select::new("Ação:", labels).prompt() else {
                return;
            };
            let Some(action) = offered.iter().find(|a| a.label == choice) else {
                break;
            };
            let Some(event) = action_event(&action.data, console.last_message_id()) else {
                break;
            };
            engine.handle_event(event).await;
        }
    }
}

fn action_event(data: &str, message_id: i64) -> Option<PipelineEvent> {
    let (action, handle) = data.split_once(':')?;
    let handle = handle.to_string();
    let action_id = "console".to_string();
    match action {
        "confirm" => Some(PipelineEvent::ConfirmPressed {
            chat_id: CONSOLE_CHAT_ID,
            message_id,
            action_id,
            handle,
        }),
        "edit" => Some(PipelineEvent::EditPressed {
            chat_id: CONSOLE_CHAT_ID,
            message_id,
            action_id,
            handle,
        }),
        "cancel" => Some(PipelineEvent::CancelPressed {
            chat_id: CONSOLE_CHAT_ID,
            message_id,
            action_id,
            handle,
        }),
        "undo" => Some(PipelineEvent::UndoPressed {
            chat_id: CONSOLE_CHAT_ID,
            message_id,
            action_id,
            handle,
        }),
        _ => None,
    }
}

/// Stdout-backed chat, so the full pipeline runs locally without Telegram.
pub struct ConsoleChatService {
    next_message_id: AtomicI64,
    last_message_id: AtomicI64,
    offered: StdMutex<Vec<ChatAction>>,
}

impl ConsoleChatService {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1),
            last_message_id: AtomicI64::new(0),
            offered: StdMutex::new(Vec::new()),
        }
    }

    pub fn take_offered(&self) -> Vec<ChatAction> {
        std::mem::take(&mut *self.offered.lock().unwrap())
    }

    pub fn last_message_id(&self) -> i64 {
        self.last_message_id.load(Ordering::SeqCst)
    }

    fn show(&self, text: &str, actions: &[ChatAction]) {
        println!("\n{}", text);
        *self.offered.lock().unwrap() = actions.to_vec();
    }
}

impl Default for ConsoleChatService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for ConsoleChatService {
    async fn send_message(
        &self,
        _chat_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<i64, String> {
        self.show(text, actions);
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.last_message_id.store(id, Ordering::SeqCst);
        Ok(id)
    }

    async fn edit_message(
        &self,
        _chat_id: i64,
        _message_id: i64,
        text: &str,
        actions: &[ChatAction],
    ) -> Result<(), String> {
        self.show(text, actions);
        Ok(())
    }

    async fn answer_action(&self, _action_id: &str, _text: &str) -> Result<(), String> {
        Ok(())
    }
}
