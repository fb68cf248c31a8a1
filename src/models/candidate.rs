use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Success,
    Ambiguous,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: Option<String>,
    pub resolved: bool,
}

/// Best-effort structured guess produced by the language model for one user
/// message. Date and time fields stay raw strings here; the validator owns
/// every format decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCandidate {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub all_day: bool,
    pub participants: Vec<Participant>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub ambiguities: Vec<String>,
    pub confidence: f64,
    pub status: CandidateStatus,
}

impl ParsedCandidate {
    /// Decodes the raw model payload. Absent or ill-typed fields degrade to
    /// their defaults instead of failing: the model output is untrusted.
    pub fn from_payload(payload: &str) -> Self {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Self::from_value(&value),
            Err(err) => Self::parse_failure(format!("resposta do modelo não é JSON: {}", err)),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let duration_minutes = value
            .get("duration_minutes")
            .and_then(Value::as_i64)
            .filter(|minutes| *minutes >= 0);

        let participants = value
            .get("participants")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(participant_from_value).collect())
            .unwrap_or_default();

        let ambiguities = value
            .get("ambiguities")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| text.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        let status = match value.get("status").and_then(Value::as_str) {
            Some("ambiguous") => CandidateStatus::Ambiguous,
            Some("error") => CandidateStatus::Error,
            _ => CandidateStatus::Success,
        };

        Self {
            title: string_field(value, "title"),
            start_date: string_field(value, "start_date"),
            start_time: string_field(value, "start_time"),
            end_time: string_field(value, "end_time"),
            duration_minutes,
            all_day: value.get("all_day").and_then(Value::as_bool).unwrap_or(false),
            participants,
            description: string_field(value, "description"),
            location: string_field(value, "location"),
            ambiguities,
            confidence,
            status,
        }
    }

    /// Synthesized candidate for collaborator failures: the pipeline always
    /// gets a candidate, never a propagated error.
    pub fn parse_failure(reason: String) -> Self {
        Self {
            title: None,
            start_date: None,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            all_day: false,
            participants: Vec::new(),
            description: None,
            location: None,
            ambiguities: vec![reason],
            confidence: 0.0,
            status: CandidateStatus::Error,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn participant_from_value(value: &Value) -> Option<Participant> {
    let name = string_field(value, "name")?;
    Some(Participant {
        name,
        email: string_field(value, "email"),
        resolved: value.get("resolved").and_then(Value::as_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_payload() {
        let payload = r#"{
            "title": "Reunião com João",
            "start_date": "2026-03-10",
            "start_time": "14:30",
            "end_time": "15:30",
            "duration_minutes": 60,
            "all_day": false,
            "participants": [{"name": "João", "email": "joao@example.com", "resolved": true}],
            "description": "Pauta de vendas",
            "location": "Sala 2",
            "ambiguities": [],
            "confidence": 0.92,
            "status": "success"
        }"#;

        let candidate = ParsedCandidate::from_payload(payload);
        assert_eq!(candidate.title.as_deref(), Some("Reunião com João"));
        assert_eq!(candidate.start_time.as_deref(), Some("14:30"));
        assert_eq!(candidate.duration_minutes, Some(60));
        assert_eq!(candidate.participants.len(), 1);
        assert!(candidate.participants[0].resolved);
        assert_eq!(candidate.status, CandidateStatus::Success);
    }

    #[test]
    fn ill_typed_fields_degrade_to_defaults() {
        let payload = r#"{
            "title": 42,
            "start_date": ["2026-03-10"],
            "duration_minutes": "sixty",
            "all_day": "yes",
            "participants": [{"email": "semnome@example.com"}, "texto"],
            "confidence": "high"
        }"#;

        let candidate = ParsedCandidate::from_payload(payload);
        assert_eq!(candidate.title, None);
        assert_eq!(candidate.start_date, None);
        assert_eq!(candidate.duration_minutes, None);
        assert!(!candidate.all_day);
        assert!(candidate.participants.is_empty());
        assert_eq!(candidate.confidence, 0.0);
        assert_eq!(candidate.status, CandidateStatus::Success);
    }

    #[test]
    fn explicit_zero_duration_is_preserved() {
        let candidate = ParsedCandidate::from_payload(r#"{"duration_minutes": 0}"#);
        assert_eq!(candidate.duration_minutes, Some(0));

        let negative = ParsedCandidate::from_payload(r#"{"duration_minutes": -15}"#);
        assert_eq!(negative.duration_minutes, None);
    }

    #[test]
    fn confidence_is_clamped() {
        let candidate = ParsedCandidate::from_payload(r#"{"confidence": 3.5}"#);
        assert_eq!(candidate.confidence, 1.0);
    }

    #[test]
    fn non_json_payload_becomes_error_candidate() {
        let candidate = ParsedCandidate::from_payload("agenda isso aí");
        assert_eq!(candidate.status, CandidateStatus::Error);
        assert_eq!(candidate.ambiguities.len(), 1);
    }

    #[test]
    fn blank_strings_become_none() {
        let candidate = ParsedCandidate::from_payload(r#"{"title": "   ", "location": ""}"#);
        assert_eq!(candidate.title, None);
        assert_eq!(candidate.location, None);
    }
}
