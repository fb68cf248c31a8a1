use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration};
use uuid::Uuid;

use crate::config::Settings;
use crate::models::candidate::ParsedCandidate;
use crate::models::event::ValidatedEvent;
use crate::models::undo::UndoRecord;
use crate::service::calendar_service::{CalendarService, EventCreateRequest, EventMoment};
use crate::service::chat_service::ChatService;
use crate::service::clock::{Clock, TimerScheduler};
use crate::service::conflict::ConflictDetector;
use crate::service::messages;
use crate::service::openai_service::OpenAIClient;
use crate::service::overlap;
use crate::service::pending::{PendingAttempt, PendingStore};
use crate::service::undo_store::UndoStore;
use crate::service::validator::{self, ValidationResult};

#[derive(Debug)]
pub enum PipelineEvent {
    MessageReceived {
        chat_id: i64,
        text: String,
    },
    ConfirmPressed {
        chat_id: i64,
        message_id: i64,
        action_id: String,
        handle: String,
    },
    EditPressed {
        chat_id: i64,
        message_id: i64,
        action_id: String,
        handle: String,
    },
    CancelPressed {
        chat_id: i64,
        message_id: i64,
        action_id: String,
        handle: String,
    },
    UndoPressed {
        chat_id: i64,
        message_id: i64,
        action_id: String,
        handle: String,
    },
}

/// Sequences one creation attempt: parse, validate, conflict-check,
/// preview, then the confirm/create/undo tail. Every attempt is keyed by an
/// opaque handle, so rapid messages from the same chat cannot cross-talk.
pub struct PipelineEngine {
    openai: Arc<dyn OpenAIClient>,
    calendar: Arc<dyn CalendarService>,
    chat: Arc<dyn ChatService>,
    detector: ConflictDetector,
    pending: Arc<PendingStore>,
    undo: Arc<UndoStore>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TimerScheduler>,
    settings: Settings,
}

impl PipelineEngine {
    pub fn new(
        openai: Arc<dyn OpenAIClient>,
        calendar: Arc<dyn CalendarService>,
        chat: Arc<dyn ChatService>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TimerScheduler>,
        settings: Settings,
    ) -> Self {
        let detector =
            ConflictDetector::new(calendar.clone(), settings.default_duration_minutes);
        let pending = Arc::new(PendingStore::new(clock.clone(), scheduler.clone()));
        let undo = Arc::new(UndoStore::new(clock.clone(), scheduler.clone()));
        Self {
            openai,
            calendar,
            chat,
            detector,
            pending,
            undo,
            clock,
            scheduler,
            settings,
        }
    }

    pub async fn handle_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::MessageReceived { chat_id, text } => {
                self.handle_message(chat_id, text).await;
            }
            PipelineEvent::ConfirmPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            } => {
                self.handle_confirm(chat_id, message_id, &action_id, &handle)
                    .await;
            }
            PipelineEvent::EditPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            } => {
                self.handle_edit(chat_id, message_id, &action_id, &handle)
                    .await;
            }
            PipelineEvent::CancelPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            } => {
                self.handle_cancel(chat_id, message_id, &action_id, &handle)
                    .await;
            }
            PipelineEvent::UndoPressed {
                chat_id,
                message_id,
                action_id,
                handle,
            } => {
                self.handle_undo(chat_id, message_id, &action_id, &handle)
                    .await;
            }
        }
    }

    async fn handle_message(&self, chat_id: i64, text: String) {
        let candidate = self.parse_candidate(&text).await;
        match validator::validate(&candidate, self.clock.now_local()) {
            ValidationResult::Ambiguous { clarification } => {
                self.send_plain(chat_id, &format!("🤔 {}", clarification)).await;
            }
            ValidationResult::Invalid {
                errors,
                clarification,
            } => {
                let body = clarification.unwrap_or_else(|| {
                    errors
                        .iter()
                        .map(|error| error.clarification())
                        .collect::<Vec<String>>()
                        .join("\n")
                });
                self.send_plain(chat_id, &format!("❗ {}", body)).await;
            }
            ValidationResult::Valid { event, warnings } => {
                self.start_preview(chat_id, event, warnings).await;
            }
        }
    }

    /// The pipeline always gets a candidate: collaborator failures and
    /// unusable payloads come back as synthesized error candidates.
    async fn parse_candidate(&self, text: &str) -> ParsedCandidate {
        if text.trim().is_empty() {
            return ParsedCandidate::parse_failure("Recebi uma mensagem vazia.".to_string());
        }
        match self.openai.generate_prompt(text, "event_extraction").await {
            Ok(payload) => ParsedCandidate::from_payload(&payload),
            Err(err) => {
                eprintln!("Failed to call OpenAI for event extraction: {}", err);
                ParsedCandidate::parse_failure(
                    "Não consegui interpretar a mensagem agora. Tente novamente.".to_string(),
                )
            }
        }
    }

    async fn start_preview(
        &self,
        chat_id: i64,
        event: ValidatedEvent,
        warnings: Vec<validator::ValidationWarning>,
    ) {
        let report = self
            .detector
            .check_conflicts(&event, &self.settings.calendar_id)
            .await;

        let handle = self.new_handle();
        let body = messages::render_preview(&event, &report, &warnings);
        let actions = messages::preview_actions(&handle);
        let expires_at =
            self.clock.now() + Duration::seconds(self.settings.preview_ttl_seconds);

        self.pending.insert(
            &handle,
            PendingAttempt {
                event,
                conflicts: report,
                warnings,
                chat_id,
                message_id: None,
                expires_at,
            },
        );

        match self.chat.send_message(chat_id, &body, &actions).await {
            Ok(message_id) => self.pending.set_message_id(&handle, message_id),
            Err(err) => {
                eprintln!("Failed to send preview: {}", err);
                // No orphaned attempt behind an unsent preview.
                let _ = self.pending.consume(&handle);
            }
        }
    }

    async fn handle_confirm(
        &self,
        chat_id: i64,
        message_id: i64,
        action_id: &str,
        handle: &str,
    ) {
        self.ack(action_id).await;
        let Some(attempt) = self.pending.consume(handle) else {
            self.edit_plain(chat_id, message_id, &messages::render_unavailable())
                .await;
            return;
        };

        let request = build_create_request(
            &attempt.event,
            &self.settings.owner_email,
            self.settings.default_duration_minutes,
        );
        let created = match self
            .calendar
            .create_event(&self.settings.calendar_id, &request)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                eprintln!("Failed to create calendar event: {}", err);
                self.edit_plain(chat_id, message_id, &messages::render_create_failed())
                    .await;
                return;
            }
        };

        let now = self.clock.now();
        let record = UndoRecord {
            external_event_id: created.id.clone(),
            calendar_id: self.settings.calendar_id.clone(),
            event_title: attempt.event.title.clone(),
            created_at: now,
            undo_deadline: now + Duration::seconds(self.settings.undo_window_seconds),
        };
        self.undo.register(handle, record);
        self.schedule_window_notice(
            chat_id,
            message_id,
            handle,
            attempt.event.title.clone(),
            created.html_link.clone(),
        );

        let body = messages::render_created(
            &attempt.event.title,
            created.html_link.as_deref(),
            self.undo.remaining_seconds(handle),
        );
        if let Err(err) = self
            .chat
            .edit_message(chat_id, message_id, &body, &messages::undo_actions(handle))
            .await
        {
            eprintln!("Failed to update confirmation message: {}", err);
        }
    }

    async fn handle_cancel(
        &self,
        chat_id: i64,
        message_id: i64,
        action_id: &str,
        handle: &str,
    ) {
        self.ack(action_id).await;
        let body = if self.pending.consume(handle).is_some() {
            messages::render_cancelled()
        } else {
            messages::render_unavailable()
        };
        self.edit_plain(chat_id, message_id, &body).await;
    }

    async fn handle_edit(&self, chat_id: i64, message_id: i64, action_id: &str, handle: &str) {
        self.ack(action_id).await;
        let body = if self.pending.consume(handle).is_some() {
            messages::render_edit_instructions()
        } else {
            messages::render_unavailable()
        };
        self.edit_plain(chat_id, message_id, &body).await;
    }

    async fn handle_undo(&self, chat_id: i64, message_id: i64, action_id: &str, handle: &str) {
        self.ack(action_id).await;
        match self.undo.consume(handle) {
            Some(record) => {
                match self
                    .calendar
                    .delete_event(&record.calendar_id, &record.external_event_id)
                    .await
                {
                    Ok(()) => {
                        self.edit_plain(
                            chat_id,
                            message_id,
                            &messages::render_undo_done(&record.event_title),
                        )
                        .await;
                    }
                    Err(err) => {
                        eprintln!("Failed to delete calendar event: {}", err);
                        self.edit_plain(
                            chat_id,
                            message_id,
                            &messages::render_undo_failed(&record.event_title),
                        )
                        .await;
                    }
                }
            }
            None => {
                self.edit_plain(chat_id, message_id, &messages::render_undo_expired())
                    .await;
            }
        }
    }

    /// Flips the confirmation message to its expired affordance when the
    /// window closes. No-ops when the record was already consumed.
    fn schedule_window_notice(
        &self,
        chat_id: i64,
        message_id: i64,
        handle: &str,
        event_title: String,
        event_link: Option<String>,
    ) {
        let chat = Arc::clone(&self.chat);
        let undo = Arc::clone(&self.undo);
        let key = handle.to_string();
        let delay = StdDuration::from_secs(self.settings.undo_window_seconds.max(0) as u64);
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                if !undo.contains(&key) {
                    return;
                }
                let body =
                    messages::render_window_closed(&event_title, event_link.as_deref());
                tokio::spawn(async move {
                    if let Err(err) = chat.edit_message(chat_id, message_id, &body, &[]).await {
                        eprintln!("Failed to update expired undo affordance: {}", err);
                    }
                });
            }),
        );
    }

    fn new_handle(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.clock.now().timestamp_millis(), &suffix[..8])
    }

    async fn ack(&self, action_id: &str) {
        if let Err(err) = self.chat.answer_action(action_id, "").await {
            eprintln!("Failed to acknowledge action: {}", err);
        }
    }

    async fn send_plain(&self, chat_id: i64, text: &str) {
        if let Err(err) = self.chat.send_message(chat_id, text, &[]).await {
            eprintln!("Failed to send message: {}", err);
        }
    }

    async fn edit_plain(&self, chat_id: i64, message_id: i64, text: &str) {
        if let Err(err) = self.chat.edit_message(chat_id, message_id, text, &[]).await {
            eprintln!("Failed to edit message: {}", err);
        }
    }
}

/// Maps a validated event onto the backend's creation shape. Instants are
/// composed textually against the fixed UTC-3 offset; a computed end that
/// wraps past midnight rolls the end date to the next calendar day.
pub fn build_create_request(
    event: &ValidatedEvent,
    owner_email: &str,
    default_duration_minutes: i64,
) -> EventCreateRequest {
    let mut attendee_emails = vec![owner_email.to_string()];
    for participant in &event.participants {
        if !participant.resolved {
            continue;
        }
        if let Some(email) = &participant.email {
            if !attendee_emails.contains(email) {
                attendee_emails.push(email.clone());
            }
        }
    }

    let (start, end) = if event.all_day {
        // All-day events use bare dates with an exclusive next-day end.
        let end_date = event.start_date + Duration::days(1);
        (
            EventMoment::Date(format_date(event.start_date)),
            EventMoment::Date(format_date(end_date)),
        )
    } else {
        let start_minutes = event.start_minutes().unwrap_or(0);
        let end_total = match event.end_minutes() {
            Some(end) => end,
            None => {
                start_minutes + event.duration_minutes.unwrap_or(default_duration_minutes)
            }
        };
        let end_date =
            event.start_date + Duration::days(end_total.div_euclid(overlap::MINUTES_PER_DAY));
        let end_clock = end_total.rem_euclid(overlap::MINUTES_PER_DAY);
        (
            EventMoment::DateTime(compose_instant(event.start_date, start_minutes)),
            EventMoment::DateTime(compose_instant(end_date, end_clock)),
        )
    };

    EventCreateRequest {
        summary: event.title.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        start,
        end,
        attendee_emails,
    }
}

fn compose_instant(date: chrono::NaiveDate, minutes: i64) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:00-03:00",
        date.year(),
        date.month(),
        date.day(),
        minutes / 60,
        minutes % 60
    )
}

fn format_date(date: chrono::NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}
