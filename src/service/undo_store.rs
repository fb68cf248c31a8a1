use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;

use crate::models::undo::UndoRecord;
use crate::service::clock::{Clock, TimerHandle, TimerScheduler};

/// The eviction timer fires slightly after the deadline; consumption is
/// already deadline-checked, the timer is only a memory safety net.
pub const EVICTION_GRACE_SECONDS: i64 = 5;

struct StoredUndo {
    record: UndoRecord,
    eviction: TimerHandle,
}

/// Time-boxed registry of reversible creations, keyed by the opaque event
/// handle. Records are handed out at most once; expiry wins over late
/// consumption; a background one-shot timer physically evicts leftovers.
pub struct UndoStore {
    entries: Arc<Mutex<HashMap<String, StoredUndo>>>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TimerScheduler>,
}

impl UndoStore {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn TimerScheduler>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            scheduler,
        }
    }

    /// Inserts or replaces the record for a handle. A replaced entry's
    /// eviction timer is cancelled before the new one is scheduled, so a
    /// stale timer can never evict a live record.
    pub fn register(&self, handle: &str, record: UndoRecord) {
        let delay = (record.undo_deadline - self.clock.now())
            + Duration::seconds(EVICTION_GRACE_SECONDS);
        let delay = delay.to_std().unwrap_or_default();

        let entries = Arc::clone(&self.entries);
        let clock = Arc::clone(&self.clock);
        let key = handle.to_string();
        let eviction = self.scheduler.schedule(
            delay,
            Box::new(move || {
                // Check-then-act under the lock: a consumed or replaced
                // entry is left alone.
                let mut entries = entries.lock().unwrap();
                let expired = entries
                    .get(&key)
                    .map(|entry| entry.record.undo_deadline < clock.now())
                    .unwrap_or(false);
                if expired {
                    entries.remove(&key);
                }
            }),
        );

        let mut entries = self.entries.lock().unwrap();
        if let Some(previous) = entries.insert(handle.to_string(), StoredUndo { record, eviction }) {
            previous.eviction.cancel();
        }
    }

    /// Atomically removes and returns the record when still inside the undo
    /// window. An expired entry is removed and yields None. At most once:
    /// any second call for the same handle returns None.
    pub fn consume(&self, handle: &str) -> Option<UndoRecord> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.remove(handle)?;
        entry.eviction.cancel();
        if self.clock.now() <= entry.record.undo_deadline {
            Some(entry.record)
        } else {
            None
        }
    }

    /// Reads without removing, under the same deadline check.
    pub fn peek(&self, handle: &str) -> Option<UndoRecord> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(handle)?;
        if self.clock.now() <= entry.record.undo_deadline {
            Some(entry.record.clone())
        } else {
            None
        }
    }

    pub fn is_alive(&self, handle: &str) -> bool {
        self.peek(handle).is_some()
    }

    /// Ceiling of seconds until the deadline; 0 when absent or expired.
    pub fn remaining_seconds(&self, handle: &str) -> i64 {
        let entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(handle) else {
            return 0;
        };
        let remaining_ms = (entry.record.undo_deadline - self.clock.now()).num_milliseconds();
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms + 999) / 1000
        }
    }

    /// Physical presence, ignoring the deadline. An expired-but-unevicted
    /// entry is still contained; a consumed one is not.
    pub fn contains(&self, handle: &str) -> bool {
        self.entries.lock().unwrap().contains_key(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::clock::{FixedClock, ManualScheduler};
    use chrono::{TimeZone, Utc};

    fn store_at_noon() -> (UndoStore, Arc<FixedClock>, Arc<ManualScheduler>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        ));
        let scheduler = Arc::new(ManualScheduler::new());
        let store = UndoStore::new(clock.clone(), scheduler.clone());
        (store, clock, scheduler)
    }

    fn record(clock: &FixedClock, window_seconds: i64) -> UndoRecord {
        let now = clock.now();
        UndoRecord {
            external_event_id: "evt-1".to_string(),
            calendar_id: "primary".to_string(),
            event_title: "Reunião".to_string(),
            created_at: now,
            undo_deadline: now + Duration::seconds(window_seconds),
        }
    }

    #[test]
    fn consume_is_at_most_once() {
        let (store, clock, _) = store_at_noon();
        store.register("h1", record(&clock, 120));

        let first = store.consume("h1");
        assert!(first.is_some());
        assert_eq!(first.unwrap().external_event_id, "evt-1");
        assert!(store.consume("h1").is_none());
    }

    #[test]
    fn consume_after_deadline_returns_none_before_eviction() {
        let (store, clock, scheduler) = store_at_noon();
        store.register("h1", record(&clock, 120));

        clock.advance(Duration::seconds(121));
        // Physically present until the evictor runs, but already dead.
        assert!(store.contains("h1"));
        assert!(!store.is_alive("h1"));
        assert!(store.consume("h1").is_none());
        assert!(!store.contains("h1"));

        // The pending eviction timer is a no-op for the consumed entry.
        scheduler.fire_all();
        assert!(!store.contains("h1"));
    }

    #[test]
    fn eviction_timer_removes_expired_entries() {
        let (store, clock, scheduler) = store_at_noon();
        store.register("h1", record(&clock, 120));

        clock.advance(Duration::seconds(120 + EVICTION_GRACE_SECONDS + 1));
        assert!(store.contains("h1"));
        scheduler.fire_all();
        assert!(!store.contains("h1"));
    }

    #[test]
    fn eviction_timer_spares_live_entries() {
        let (store, clock, scheduler) = store_at_noon();
        store.register("h1", record(&clock, 120));

        // Timer firing early (clock untouched) must not evict.
        scheduler.fire_all();
        assert!(store.is_alive("h1"));
    }

    #[test]
    fn reregistration_replaces_record_and_cancels_old_timer() {
        let (store, clock, scheduler) = store_at_noon();
        store.register("h1", record(&clock, 60));

        clock.advance(Duration::seconds(30));
        let mut newer = record(&clock, 120);
        newer.external_event_id = "evt-2".to_string();
        store.register("h1", newer);

        // Past the first record's deadline plus grace; the first timer was
        // cancelled and the replacement must survive.
        clock.advance(Duration::seconds(40));
        scheduler.fire_all();
        assert!(store.is_alive("h1"));
        assert_eq!(store.consume("h1").unwrap().external_event_id, "evt-2");
    }

    #[test]
    fn peek_does_not_remove() {
        let (store, clock, _) = store_at_noon();
        store.register("h1", record(&clock, 120));

        assert!(store.peek("h1").is_some());
        assert!(store.peek("h1").is_some());
        assert!(store.consume("h1").is_some());
        assert!(store.peek("h1").is_none());
    }

    #[test]
    fn remaining_seconds_is_a_ceiling() {
        let (store, clock, _) = store_at_noon();
        store.register("h1", record(&clock, 120));

        assert_eq!(store.remaining_seconds("h1"), 120);
        clock.advance(Duration::milliseconds(500));
        assert_eq!(store.remaining_seconds("h1"), 120);
        clock.advance(Duration::seconds(30));
        assert_eq!(store.remaining_seconds("h1"), 90);
        clock.advance(Duration::seconds(120));
        assert_eq!(store.remaining_seconds("h1"), 0);
        assert_eq!(store.remaining_seconds("desconhecido"), 0);
    }
}
