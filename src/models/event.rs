use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::candidate::Participant;
use crate::service::overlap;

/// Canonical event shape committed by the validator. Read-only afterwards:
/// the conflict detector and the calendar creation path only borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedEvent {
    pub title: String,
    pub start_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub all_day: bool,
    pub participants: Vec<Participant>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl ValidatedEvent {
    pub fn start_minutes(&self) -> Option<i64> {
        self.start_time.as_deref().and_then(overlap::parse_clock)
    }

    pub fn end_minutes(&self) -> Option<i64> {
        self.end_time.as_deref().and_then(overlap::parse_clock)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictInfo {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub external_event_id: String,
    pub event_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictInfo>,
}

impl ConflictReport {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_conflicts(conflicts: Vec<ConflictInfo>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}
