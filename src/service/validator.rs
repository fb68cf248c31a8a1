use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

use crate::models::candidate::{CandidateStatus, ParsedCandidate};
use crate::models::event::ValidatedEvent;
use crate::service::overlap;

pub const MAX_DAYS_AHEAD: i64 = 365;
pub const DURATION_TOLERANCE_MINUTES: i64 = 5;

/// Ambiguity tags carrying these markers mean the model saw a date it could
/// not make real (30/02 and friends). They outrank plain vagueness.
const INVALID_DATE_MARKERS: [&str; 2] = ["data inválida", "invalid date"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    TitleMissing,
    DateMissing,
    TimeMissing,
    TitleLengthInvalid,
    DateFormatInvalid,
    TimeFormatInvalid,
    EndTimeFormatInvalid,
    DateTooFarFuture,
    DateOutOfRange,
    TimeEndBeforeStart,
    /// Pass-through text, e.g. an invalid-date tag coming straight from the
    /// parser. Presented to the user verbatim.
    Other(String),
}

impl ValidationError {
    pub fn clarification(&self) -> String {
        match self {
            ValidationError::TitleMissing => "Qual é o título do evento?".to_string(),
            ValidationError::DateMissing => {
                "Para qual data devo agendar o evento?".to_string()
            }
            ValidationError::TimeMissing => {
                "Em qual horário o evento deve começar?".to_string()
            }
            ValidationError::TitleLengthInvalid => {
                "O título precisa ter entre 1 e 100 caracteres. Pode reformular?".to_string()
            }
            ValidationError::DateFormatInvalid => {
                "Não entendi a data informada. Pode repetir? (ex: 25/12/2026)".to_string()
            }
            ValidationError::TimeFormatInvalid => {
                "Não entendi o horário informado. Pode repetir no formato HH:MM? (ex: 14:30)"
                    .to_string()
            }
            ValidationError::EndTimeFormatInvalid => {
                "Não entendi o horário de término. Pode repetir no formato HH:MM? (ex: 16:00)"
                    .to_string()
            }
            ValidationError::DateTooFarFuture => {
                "Essa data está a mais de um ano no futuro. Pode confirmar a data?".to_string()
            }
            ValidationError::DateOutOfRange => {
                "Essa data já passou. Para qual data futura devo agendar?".to_string()
            }
            ValidationError::TimeEndBeforeStart => {
                "O horário de término precisa ser depois do horário de início. Pode corrigir?"
                    .to_string()
            }
            ValidationError::Other(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationWarning {
    DateRetroactiveSameDay,
    DurationMismatchTimes,
}

#[derive(Debug, Clone)]
pub enum ValidationResult {
    Valid {
        event: ValidatedEvent,
        warnings: Vec<ValidationWarning>,
    },
    Ambiguous {
        clarification: String,
    },
    Invalid {
        errors: Vec<ValidationError>,
        clarification: Option<String>,
    },
}

/// Converts a parsed candidate into a committed event, a clarification
/// request, or a rejection. Pure: `now` is the caller-supplied reference
/// instant (fixed UTC-3), the only notion of "today" the rules consult.
pub fn validate(candidate: &ParsedCandidate, now: DateTime<FixedOffset>) -> ValidationResult {
    if candidate.status == CandidateStatus::Error {
        let reason = candidate
            .ambiguities
            .first()
            .cloned()
            .unwrap_or_else(|| "Não consegui interpretar a mensagem.".to_string());
        return ValidationResult::Invalid {
            errors: vec![ValidationError::Other(reason)],
            clarification: None,
        };
    }

    if !candidate.ambiguities.is_empty() {
        let (invalid_dates, vague): (Vec<&String>, Vec<&String>) = candidate
            .ambiguities
            .iter()
            .partition(|tag| is_invalid_date_tag(tag));

        if !invalid_dates.is_empty() {
            let errors: Vec<ValidationError> = invalid_dates
                .into_iter()
                .map(|tag| ValidationError::Other(tag.clone()))
                .collect();
            let clarification = join_clarifications(&errors);
            return ValidationResult::Invalid {
                errors,
                clarification: Some(clarification),
            };
        }

        let clarification = vague
            .iter()
            .map(|tag| clarification_for_ambiguity(tag))
            .collect::<Vec<String>>()
            .join("\n");
        return ValidationResult::Ambiguous { clarification };
    }

    let mut errors: Vec<ValidationError> = Vec::new();
    let mut warnings: Vec<ValidationWarning> = Vec::new();

    let title = candidate.title.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() {
        errors.push(ValidationError::TitleMissing);
    } else if title.chars().count() > 100 {
        errors.push(ValidationError::TitleLengthInvalid);
    }

    let today = now.date_naive();
    let mut start_date: Option<NaiveDate> = None;
    match candidate.start_date.as_deref() {
        None => errors.push(ValidationError::DateMissing),
        Some(text) => match parse_calendar_date(text) {
            None => errors.push(ValidationError::DateFormatInvalid),
            Some(date) => {
                if date < today {
                    errors.push(ValidationError::DateOutOfRange);
                } else if (date - today).num_days() > MAX_DAYS_AHEAD {
                    errors.push(ValidationError::DateTooFarFuture);
                }
                start_date = Some(date);
            }
        },
    }

    let mut start_minutes: Option<i64> = None;
    let mut end_minutes: Option<i64> = None;
    if !candidate.all_day {
        match candidate.start_time.as_deref() {
            None => errors.push(ValidationError::TimeMissing),
            Some(text) => match overlap::parse_clock(text) {
                Some(minutes) => start_minutes = Some(minutes),
                None => errors.push(ValidationError::TimeFormatInvalid),
            },
        }
        if let Some(text) = candidate.end_time.as_deref() {
            match overlap::parse_clock(text) {
                Some(minutes) => end_minutes = Some(minutes),
                None => errors.push(ValidationError::EndTimeFormatInvalid),
            }
        }
    }

    // Same-day is never a rejection; it only warns when the requested clock
    // time already passed in the reference offset.
    if let (Some(date), Some(start)) = (start_date, start_minutes) {
        if date == today {
            let now_minutes = i64::from(now.hour()) * 60 + i64::from(now.minute());
            if start < now_minutes {
                warnings.push(ValidationWarning::DateRetroactiveSameDay);
            }
        }
    }

    if let (Some(start), Some(end)) = (start_minutes, end_minutes) {
        if end <= start {
            errors.push(ValidationError::TimeEndBeforeStart);
        } else if let Some(duration) = candidate.duration_minutes {
            if (duration - (end - start)).abs() > DURATION_TOLERANCE_MINUTES {
                warnings.push(ValidationWarning::DurationMismatchTimes);
            }
        }
    }

    if !errors.is_empty() {
        let clarification = join_clarifications(&errors);
        return ValidationResult::Invalid {
            errors,
            clarification: Some(clarification),
        };
    }

    let Some(start_date) = start_date else {
        return ValidationResult::Invalid {
            errors: vec![ValidationError::DateMissing],
            clarification: Some(ValidationError::DateMissing.clarification()),
        };
    };

    let (start_time, end_time) = if candidate.all_day {
        (None, None)
    } else {
        (
            start_minutes.map(overlap::format_clock),
            end_minutes.map(overlap::format_clock),
        )
    };

    let event = ValidatedEvent {
        title: title.to_string(),
        start_date,
        start_time,
        end_time,
        duration_minutes: candidate.duration_minutes,
        all_day: candidate.all_day,
        participants: candidate.participants.clone(),
        description: candidate.description.clone(),
        location: candidate.location.clone(),
    };

    ValidationResult::Valid { event, warnings }
}

fn is_invalid_date_tag(tag: &str) -> bool {
    let lower = tag.to_lowercase();
    INVALID_DATE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

fn clarification_for_ambiguity(tag: &str) -> String {
    let lower = tag.to_lowercase();
    if lower.contains("horário") || lower.contains("hora") {
        "Por favor, informe o horário exato do evento. (ex: 14:30)".to_string()
    } else if lower.contains("data") {
        "Por favor, informe a data exata do evento. (ex: 25/12/2026)".to_string()
    } else {
        tag.to_string()
    }
}

fn join_clarifications(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::clarification)
        .collect::<Vec<String>>()
        .join("\n")
}

/// Strict YYYY-MM-DD grammar plus a real-calendar check: the components
/// must survive reconstruction into an actual date (Feb 30 does not).
fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    if ![year, month, day]
        .iter()
        .all(|part| part.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Participant;
    use chrono::TimeZone;

    fn reference_now() -> DateTime<FixedOffset> {
        // Tuesday 2026-03-10, 10:00 at UTC-3.
        crate::service::clock::reference_offset()
            .with_ymd_and_hms(2026, 3, 10, 10, 0, 0)
            .unwrap()
    }

    fn candidate(title: &str, date: &str, time: &str) -> ParsedCandidate {
        ParsedCandidate {
            title: Some(title.to_string()),
            start_date: Some(date.to_string()),
            start_time: Some(time.to_string()),
            end_time: None,
            duration_minutes: None,
            all_day: false,
            participants: Vec::new(),
            description: None,
            location: None,
            ambiguities: Vec::new(),
            confidence: 0.9,
            status: CandidateStatus::Success,
        }
    }

    fn expect_invalid(result: ValidationResult) -> Vec<ValidationError> {
        match result {
            ValidationResult::Invalid { errors, .. } => errors,
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    fn expect_valid(result: ValidationResult) -> (ValidatedEvent, Vec<ValidationWarning>) {
        match result {
            ValidationResult::Valid { event, warnings } => (event, warnings),
            other => panic!("expected Valid, got {:?}", other),
        }
    }

    #[test]
    fn valid_candidate_passes() {
        let mut input = candidate("Reunião com João", "2026-03-11", "14:30");
        input.end_time = Some("15:30".to_string());
        let (event, warnings) = expect_valid(validate(&input, reference_now()));
        assert_eq!(event.title, "Reunião com João");
        assert_eq!(event.start_time.as_deref(), Some("14:30"));
        assert_eq!(event.end_time.as_deref(), Some("15:30"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn error_status_passes_first_ambiguity_through() {
        let mut input = candidate("x", "2026-03-11", "14:30");
        input.status = CandidateStatus::Error;
        input.ambiguities = vec!["falha no modelo".to_string(), "outra".to_string()];
        match validate(&input, reference_now()) {
            ValidationResult::Invalid {
                errors,
                clarification,
            } => {
                assert_eq!(errors, vec![ValidationError::Other("falha no modelo".to_string())]);
                assert_eq!(clarification, None);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn invalid_date_tag_outranks_vagueness() {
        let mut input = candidate("Almoço", "2026-02-30", "12:00");
        input.ambiguities = vec![
            "horário vago".to_string(),
            "data inválida: 30/02".to_string(),
        ];
        let errors = expect_invalid(validate(&input, reference_now()));
        assert_eq!(
            errors,
            vec![ValidationError::Other("data inválida: 30/02".to_string())]
        );
    }

    #[test]
    fn vague_time_asks_for_exact_time() {
        let mut input = candidate("Almoço", "2026-03-11", "12:00");
        input.ambiguities = vec!["horário vago (\"de manhã\")".to_string()];
        match validate(&input, reference_now()) {
            ValidationResult::Ambiguous { clarification } => {
                assert!(clarification.contains("horário exato"));
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn vague_date_asks_for_exact_date() {
        let mut input = candidate("Almoço", "2026-03-11", "12:00");
        input.ambiguities = vec!["data vaga (\"semana que vem\")".to_string()];
        match validate(&input, reference_now()) {
            ValidationResult::Ambiguous { clarification } => {
                assert!(clarification.contains("data exata"));
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn unknown_ambiguity_tag_is_echoed() {
        let mut input = candidate("Almoço", "2026-03-11", "12:00");
        input.ambiguities = vec!["participante desconhecido: Zé".to_string()];
        match validate(&input, reference_now()) {
            ValidationResult::Ambiguous { clarification } => {
                assert_eq!(clarification, "participante desconhecido: Zé");
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let input = ParsedCandidate {
            title: None,
            start_date: None,
            start_time: None,
            ..candidate("x", "2026-03-11", "14:30")
        };
        let errors = expect_invalid(validate(&input, reference_now()));
        assert!(errors.contains(&ValidationError::TitleMissing));
        assert!(errors.contains(&ValidationError::DateMissing));
        assert!(errors.contains(&ValidationError::TimeMissing));
    }

    #[test]
    fn title_length_boundaries() {
        let one = candidate(&"a".repeat(1), "2026-03-11", "14:30");
        assert!(matches!(
            validate(&one, reference_now()),
            ValidationResult::Valid { .. }
        ));

        let hundred = candidate(&"a".repeat(100), "2026-03-11", "14:30");
        assert!(matches!(
            validate(&hundred, reference_now()),
            ValidationResult::Valid { .. }
        ));

        let overlong = candidate(&"a".repeat(101), "2026-03-11", "14:30");
        let errors = expect_invalid(validate(&overlong, reference_now()));
        assert_eq!(errors, vec![ValidationError::TitleLengthInvalid]);

        let blank = candidate("   ", "2026-03-11", "14:30");
        let errors = expect_invalid(validate(&blank, reference_now()));
        assert_eq!(errors, vec![ValidationError::TitleMissing]);
    }

    #[test]
    fn impossible_dates_fail_the_round_trip() {
        for date in ["2026-02-30", "2026-04-31", "2026-13-01", "2026-00-10"] {
            let input = candidate("Evento", date, "14:30");
            let errors = expect_invalid(validate(&input, reference_now()));
            assert_eq!(errors, vec![ValidationError::DateFormatInvalid], "{}", date);
        }
    }

    #[test]
    fn malformed_date_grammar_is_rejected() {
        for date in ["10/03/2026", "2026-3-10", "amanhã", "2026-03-10T00:00"] {
            let input = candidate("Evento", date, "14:30");
            let errors = expect_invalid(validate(&input, reference_now()));
            assert_eq!(errors, vec![ValidationError::DateFormatInvalid], "{}", date);
        }
    }

    #[test]
    fn leap_day_is_a_real_date() {
        let input = candidate("Evento", "2028-02-29", "14:30");
        // 2028-02-29 is within 365 days of 2027-03-10 but not of 2026-03-10;
        // validate against a later reference to isolate the format rule.
        let later = crate::service::clock::reference_offset()
            .with_ymd_and_hms(2027, 6, 1, 10, 0, 0)
            .unwrap();
        assert!(matches!(
            validate(&input, later),
            ValidationResult::Valid { .. }
        ));
    }

    #[test]
    fn date_range_boundaries() {
        // Exactly 365 days ahead of 2026-03-10 is 2027-03-10.
        let at_limit = candidate("Evento", "2027-03-10", "14:30");
        assert!(matches!(
            validate(&at_limit, reference_now()),
            ValidationResult::Valid { .. }
        ));

        let past_limit = candidate("Evento", "2027-03-11", "14:30");
        let errors = expect_invalid(validate(&past_limit, reference_now()));
        assert_eq!(errors, vec![ValidationError::DateTooFarFuture]);

        let yesterday = candidate("Evento", "2026-03-09", "14:30");
        let errors = expect_invalid(validate(&yesterday, reference_now()));
        assert_eq!(errors, vec![ValidationError::DateOutOfRange]);
    }

    #[test]
    fn today_is_valid_and_only_warns_when_time_passed() {
        let future_time = candidate("Evento", "2026-03-10", "18:00");
        let (_, warnings) = expect_valid(validate(&future_time, reference_now()));
        assert!(warnings.is_empty());

        let past_time = candidate("Evento", "2026-03-10", "08:00");
        let (_, warnings) = expect_valid(validate(&past_time, reference_now()));
        assert_eq!(warnings, vec![ValidationWarning::DateRetroactiveSameDay]);
    }

    #[test]
    fn malformed_times_are_rejected() {
        let bad_start = candidate("Evento", "2026-03-11", "25:00");
        let errors = expect_invalid(validate(&bad_start, reference_now()));
        assert_eq!(errors, vec![ValidationError::TimeFormatInvalid]);

        let mut bad_end = candidate("Evento", "2026-03-11", "14:30");
        bad_end.end_time = Some("14h45".to_string());
        let errors = expect_invalid(validate(&bad_end, reference_now()));
        assert_eq!(errors, vec![ValidationError::EndTimeFormatInvalid]);
    }

    #[test]
    fn end_must_be_strictly_after_start() {
        let mut equal = candidate("Evento", "2026-03-11", "14:30");
        equal.end_time = Some("14:30".to_string());
        let errors = expect_invalid(validate(&equal, reference_now()));
        assert_eq!(errors, vec![ValidationError::TimeEndBeforeStart]);

        let mut inverted = candidate("Evento", "2026-03-11", "14:30");
        inverted.end_time = Some("13:00".to_string());
        let errors = expect_invalid(validate(&inverted, reference_now()));
        assert_eq!(errors, vec![ValidationError::TimeEndBeforeStart]);
    }

    #[test]
    fn duration_mismatch_is_only_a_warning() {
        let mut input = candidate("Evento", "2026-03-11", "14:30");
        input.end_time = Some("15:30".to_string());
        input.duration_minutes = Some(90);
        let (event, warnings) = expect_valid(validate(&input, reference_now()));
        assert_eq!(warnings, vec![ValidationWarning::DurationMismatchTimes]);
        assert_eq!(event.duration_minutes, Some(90));
    }

    #[test]
    fn duration_within_tolerance_does_not_warn() {
        let mut input = candidate("Evento", "2026-03-11", "14:30");
        input.end_time = Some("15:30".to_string());
        input.duration_minutes = Some(64);
        let (_, warnings) = expect_valid(validate(&input, reference_now()));
        assert!(warnings.is_empty());
    }

    #[test]
    fn zero_duration_is_not_collapsed() {
        let mut input = candidate("Evento", "2026-03-11", "14:30");
        input.duration_minutes = Some(0);
        let (event, _) = expect_valid(validate(&input, reference_now()));
        assert_eq!(event.duration_minutes, Some(0));
    }

    #[test]
    fn all_day_event_nulls_times() {
        let mut input = candidate("Congresso de TI", "2026-03-11", "09:00");
        input.all_day = true;
        input.end_time = Some("18:00".to_string());
        let (event, warnings) = expect_valid(validate(&input, reference_now()));
        assert!(event.all_day);
        assert_eq!(event.start_time, None);
        assert_eq!(event.end_time, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn all_day_event_does_not_require_times() {
        let mut input = candidate("Congresso de TI", "2026-03-11", "09:00");
        input.all_day = true;
        input.start_time = None;
        assert!(matches!(
            validate(&input, reference_now()),
            ValidationResult::Valid { .. }
        ));
    }

    #[test]
    fn single_digit_hour_is_normalized() {
        let input = candidate("Café", "2026-03-11", "9:05");
        let (event, _) = expect_valid(validate(&input, reference_now()));
        assert_eq!(event.start_time.as_deref(), Some("09:05"));
    }

    #[test]
    fn participants_pass_through() {
        let mut input = candidate("Reunião", "2026-03-11", "14:30");
        input.participants = vec![Participant {
            name: "João".to_string(),
            email: Some("joao@example.com".to_string()),
            resolved: true,
        }];
        let (event, _) = expect_valid(validate(&input, reference_now()));
        assert_eq!(event.participants.len(), 1);
    }

    #[test]
    fn invalid_clarifications_map_reason_codes() {
        let input = candidate("", "2026-03-11", "14:30");
        match validate(&input, reference_now()) {
            ValidationResult::Invalid {
                clarification: Some(text),
                ..
            } => assert!(text.contains("Qual é o título do evento?")),
            other => panic!("expected Invalid with clarification, got {:?}", other),
        }
    }
}
