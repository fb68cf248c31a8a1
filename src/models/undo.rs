use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to reverse one creation. Owned exclusively by the
/// UndoStore; consumption hands the record out exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoRecord {
    pub external_event_id: String,
    pub calendar_id: String,
    pub event_title: String,
    pub created_at: DateTime<Utc>,
    pub undo_deadline: DateTime<Utc>,
}
