use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::models::event::{ConflictReport, ValidatedEvent};
use crate::service::clock::{Clock, TimerHandle, TimerScheduler};
use crate::service::undo_store::EVICTION_GRACE_SECONDS;
use crate::service::validator::ValidationWarning;

/// One previewed attempt awaiting the user's decision. The validated event
/// is retained here so confirmation acts on exactly the data that was
/// previewed.
#[derive(Clone)]
pub struct PendingAttempt {
    pub event: ValidatedEvent,
    pub conflicts: ConflictReport,
    pub warnings: Vec<ValidationWarning>,
    pub chat_id: i64,
    pub message_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

struct StoredAttempt {
    attempt: PendingAttempt,
    eviction: TimerHandle,
}

/// Preview cache with the same discipline as the undo store: TTL on every
/// entry, atomic consume, cancel-on-replace eviction timers. Abandoned
/// previews age out instead of accumulating.
pub struct PendingStore {
    entries: Arc<Mutex<HashMap<String, StoredAttempt>>>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TimerScheduler>,
}

impl PendingStore {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn TimerScheduler>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            scheduler,
        }
    }

    pub fn insert(&self, handle: &str, attempt: PendingAttempt) {
        let delay = (attempt.expires_at - self.clock.now())
            + Duration::seconds(EVICTION_GRACE_SECONDS);
        let delay = delay.to_std().unwrap_or_default();

        let entries = Arc::clone(&self.entries);
        let clock = Arc::clone(&self.clock);
        let key = handle.to_string();
        let eviction = self.scheduler.schedule(
            delay,
            Box::new(move || {
                let mut entries = entries.lock().unwrap();
                let expired = entries
                    .get(&key)
                    .map(|entry| entry.attempt.expires_at < clock.now())
                    .unwrap_or(false);
                if expired {
                    entries.remove(&key);
                }
            }),
        );

        let mut entries = self.entries.lock().unwrap();
        if let Some(previous) =
            entries.insert(handle.to_string(), StoredAttempt { attempt, eviction })
        {
            previous.eviction.cancel();
        }
    }

    /// Atomically removes and returns the attempt when still inside its TTL.
    pub fn consume(&self, handle: &str) -> Option<PendingAttempt> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.remove(handle)?;
        entry.eviction.cancel();
        if self.clock.now() <= entry.attempt.expires_at {
            Some(entry.attempt)
        } else {
            None
        }
    }

    /// Attaches the sent preview's message id after the send succeeded.
    pub fn set_message_id(&self, handle: &str, message_id: i64) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(handle) {
            entry.attempt.message_id = Some(message_id);
        }
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.entries.lock().unwrap().contains_key(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::clock::{FixedClock, ManualScheduler};
    use chrono::{NaiveDate, TimeZone};

    fn attempt(clock: &FixedClock, ttl_seconds: i64) -> PendingAttempt {
        PendingAttempt {
            event: ValidatedEvent {
                title: "Reunião".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 11).unwrap(),
                start_time: Some("14:30".to_string()),
                end_time: None,
                duration_minutes: None,
                all_day: false,
                participants: Vec::new(),
                description: None,
                location: None,
            },
            conflicts: ConflictReport::none(),
            warnings: Vec::new(),
            chat_id: 10,
            message_id: None,
            expires_at: clock.now() + Duration::seconds(ttl_seconds),
        }
    }

    fn setup() -> (PendingStore, Arc<FixedClock>, Arc<ManualScheduler>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        ));
        let scheduler = Arc::new(ManualScheduler::new());
        let store = PendingStore::new(clock.clone(), scheduler.clone());
        (store, clock, scheduler)
    }

    #[test]
    fn consume_is_at_most_once() {
        let (store, clock, _) = setup();
        store.insert("h1", attempt(&clock, 300));
        assert!(store.consume("h1").is_some());
        assert!(store.consume("h1").is_none());
    }

    #[test]
    fn expired_attempt_is_not_returned() {
        let (store, clock, _) = setup();
        store.insert("h1", attempt(&clock, 300));
        clock.advance(Duration::seconds(301));
        assert!(store.consume("h1").is_none());
    }

    #[test]
    fn evictor_drops_abandoned_previews() {
        let (store, clock, scheduler) = setup();
        store.insert("h1", attempt(&clock, 300));
        clock.advance(Duration::seconds(300 + EVICTION_GRACE_SECONDS + 1));
        assert!(store.contains("h1"));
        scheduler.fire_all();
        assert!(!store.contains("h1"));
    }

    #[test]
    fn message_id_is_attached_in_place() {
        let (store, clock, _) = setup();
        store.insert("h1", attempt(&clock, 300));
        store.set_message_id("h1", 777);
        let stored = store.consume("h1").unwrap();
        assert_eq!(stored.message_id, Some(777));
    }
}
