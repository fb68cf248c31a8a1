use chrono::{Datelike, NaiveDate};

use crate::models::event::{ConflictReport, ValidatedEvent};
use crate::service::chat_service::ChatAction;
use crate::service::validator::ValidationWarning;

const WEEKDAYS_PT: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];

const MAX_LISTED_PARTICIPANTS: usize = 3;

pub fn weekday_name_pt(date: NaiveDate) -> &'static str {
    WEEKDAYS_PT[date.weekday().num_days_from_monday() as usize]
}

pub fn format_date_pt(date: NaiveDate) -> String {
    format!(
        "{}, {:02}/{:02}/{}",
        weekday_name_pt(date),
        date.day(),
        date.month(),
        date.year()
    )
}

pub fn warning_text(warning: ValidationWarning) -> &'static str {
    match warning {
        ValidationWarning::DateRetroactiveSameDay => {
            "⚠️ O horário informado já passou hoje."
        }
        ValidationWarning::DurationMismatchTimes => {
            "⚠️ A duração informada não bate com os horários de início e término."
        }
    }
}

pub fn render_preview(
    event: &ValidatedEvent,
    report: &ConflictReport,
    warnings: &[ValidationWarning],
) -> String {
    let mut body = String::from("📅 Confirma a criação do evento?\n");
    body.push_str(&format!("\n📌 {}\n", event.title));
    body.push_str(&format!("🗓 {}\n", format_date_pt(event.start_date)));

    if event.all_day {
        body.push_str("📆 Dia todo\n");
    } else if let Some(start) = &event.start_time {
        match &event.end_time {
            Some(end) => body.push_str(&format!("🕐 {} – {}\n", start, end)),
            None => body.push_str(&format!("🕐 {}\n", start)),
        }
    }

    if !event.participants.is_empty() {
        body.push_str(&format!("👥 {}\n", participants_line(event)));
    }
    if let Some(location) = &event.location {
        body.push_str(&format!("📍 {}\n", location));
    }
    if let Some(description) = &event.description {
        body.push_str(&format!("📝 {}\n", description));
    }

    if report.has_conflicts {
        body.push_str("\n⚠️ Atenção: conflito com eventos existentes:\n");
        for conflict in &report.conflicts {
            body.push_str(&format!(
                "• {}–{} — {}\n",
                conflict.start_time, conflict.end_time, conflict.title
            ));
        }
    }

    for warning in warnings {
        body.push_str(&format!("\n{}", warning_text(*warning)));
    }

    body.trim_end().to_string()
}

fn participants_line(event: &ValidatedEvent) -> String {
    let names: Vec<&str> = event
        .participants
        .iter()
        .take(MAX_LISTED_PARTICIPANTS)
        .map(|p| p.name.as_str())
        .collect();
    let hidden = event.participants.len().saturating_sub(MAX_LISTED_PARTICIPANTS);
    if hidden == 0 {
        names.join(", ")
    } else if hidden == 1 {
        format!("{} +1 outro", names.join(", "))
    } else {
        format!("{} +{} outros", names.join(", "), hidden)
    }
}

pub fn preview_actions(handle: &str) -> Vec<ChatAction> {
    vec![
        ChatAction {
            label: "✅ Confirmar".to_string(),
            data: format!("confirm:{}", handle),
        },
        ChatAction {
            label: "✏️ Editar".to_string(),
            data: format!("edit:{}", handle),
        },
        ChatAction {
            label: "❌ Cancelar".to_string(),
            data: format!("cancel:{}", handle),
        },
    ]
}

pub fn undo_actions(handle: &str) -> Vec<ChatAction> {
    vec![ChatAction {
        label: "↩️ Desfazer".to_string(),
        data: format!("undo:{}", handle),
    }]
}

pub fn render_created(title: &str, link: Option<&str>, undo_window_seconds: i64) -> String {
    let mut body = format!("✅ Evento criado: \"{}\"", title);
    if let Some(link) = link {
        body.push_str(&format!("\n🔗 {}", link));
    }
    body.push_str(&format!(
        "\n↩️ Você pode desfazer nos próximos {}.",
        format_window(undo_window_seconds)
    ));
    body
}

pub fn render_window_closed(title: &str, link: Option<&str>) -> String {
    let mut body = format!("✅ Evento criado: \"{}\"", title);
    if let Some(link) = link {
        body.push_str(&format!("\n🔗 {}", link));
    }
    body.push_str("\n⏰ O prazo para desfazer terminou.");
    body
}

pub fn render_undo_done(title: &str) -> String {
    format!("↩️ Evento \"{}\" desfeito.", title)
}

pub fn render_undo_expired() -> String {
    "⏰ O prazo para desfazer já expirou. O evento foi mantido.".to_string()
}

pub fn render_undo_failed(title: &str) -> String {
    format!(
        "❌ Não consegui remover o evento \"{}\" na agenda. Remova manualmente, por favor.",
        title
    )
}

pub fn render_cancelled() -> String {
    "❌ Criação cancelada.".to_string()
}

pub fn render_edit_instructions() -> String {
    "✏️ Certo! Envie a mensagem novamente com os dados corrigidos.".to_string()
}

pub fn render_unavailable() -> String {
    "⏳ Esta solicitação não está mais disponível. Envie a mensagem novamente.".to_string()
}

pub fn render_create_failed() -> String {
    "❌ Não consegui criar o evento na agenda. Tente novamente em instantes.".to_string()
}

fn format_window(seconds: i64) -> String {
    if seconds % 60 == 0 && seconds >= 60 {
        let minutes = seconds / 60;
        if minutes == 1 {
            "1 minuto".to_string()
        } else {
            format!("{} minutos", minutes)
        }
    } else {
        format!("{} segundos", seconds)
    }
}
