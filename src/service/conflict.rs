use std::sync::Arc;

use crate::models::event::{ConflictInfo, ConflictReport, ValidatedEvent};
use crate::service::calendar_service::CalendarService;
use crate::service::overlap;

/// Flags true time overlaps between a candidate event and the day's
/// existing events. Fail-open: a backend outage never blocks creation.
pub struct ConflictDetector {
    calendar: Arc<dyn CalendarService>,
    default_duration_minutes: i64,
}

impl ConflictDetector {
    pub fn new(calendar: Arc<dyn CalendarService>, default_duration_minutes: i64) -> Self {
        Self {
            calendar,
            default_duration_minutes,
        }
    }

    pub async fn check_conflicts(
        &self,
        event: &ValidatedEvent,
        calendar_id: &str,
    ) -> ConflictReport {
        // All-day events never time-conflict in this model.
        if event.all_day {
            return ConflictReport::none();
        }
        let Some(start) = event.start_minutes() else {
            return ConflictReport::none();
        };
        // Effective end: explicit end time, then stated duration, then the
        // configured default. This is the same interval creation will book.
        let end = match event.end_minutes() {
            Some(end) => end,
            None => start + event.duration_minutes.unwrap_or(self.default_duration_minutes),
        };

        let existing = match self
            .calendar
            .events_for_day(event.start_date, calendar_id)
            .await
        {
            Ok(events) => events,
            Err(err) => {
                // Distinguishable in logs from an empty day; user-visible
                // behavior stays "no conflicts found".
                eprintln!(
                    "Conflict query failed for {} ({}); proceeding without conflicts",
                    event.start_date, err
                );
                return ConflictReport::none();
            }
        };

        let mut conflicts = Vec::new();
        for remote in &existing {
            let Some((remote_start, remote_end)) = remote.clock_interval() else {
                continue;
            };
            if overlap::intervals_overlap(start, end, remote_start, remote_end) {
                conflicts.push(ConflictInfo {
                    title: remote
                        .title
                        .clone()
                        .unwrap_or_else(|| "(sem título)".to_string()),
                    start_time: overlap::format_clock(remote_start),
                    end_time: overlap::format_clock(remote_end),
                    external_event_id: remote.id.clone(),
                    event_date: event.start_date,
                });
            }
        }
        ConflictReport::from_conflicts(conflicts)
    }
}
