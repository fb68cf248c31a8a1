use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike};

use crate::clients::calendar_client;
use crate::service::overlap;

/// An event as listed by the backend: either a timed start/end pair
/// (RFC3339 with the calendar's offset) or date-only all-day markers.
#[derive(Debug, Clone, Default)]
pub struct RemoteEvent {
    pub id: String,
    pub title: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date_time: Option<String>,
    pub end_date: Option<String>,
}

impl RemoteEvent {
    pub fn is_all_day(&self) -> bool {
        self.start_date_time.is_none()
    }

    /// Clock interval in minutes since midnight of the listed day, or None
    /// when there is no usable timed start (all-day entries are skipped by
    /// conflict checks). A missing end degenerates to end = start; an end
    /// that crosses midnight is clamped to the end of the listed day.
    pub fn clock_interval(&self) -> Option<(i64, i64)> {
        let start = clock_of(self.start_date_time.as_deref()?)?;
        let end = match self.end_date_time.as_deref().and_then(clock_of) {
            Some(end) if end < start => overlap::MINUTES_PER_DAY,
            Some(end) => end,
            None => start,
        };
        Some((start, end))
    }
}

fn clock_of(rfc3339: &str) -> Option<i64> {
    let instant = DateTime::parse_from_rfc3339(rfc3339).ok()?;
    Some(i64::from(instant.hour()) * 60 + i64::from(instant.minute()))
}

/// A point on the calendar as the backend expects it: a timed instant
/// composed textually against the fixed offset, or a bare date for all-day
/// events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMoment {
    DateTime(String),
    Date(String),
}

#[derive(Debug, Clone)]
pub struct EventCreateRequest {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventMoment,
    pub end: EventMoment,
    pub attendee_emails: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn events_for_day(
        &self,
        day: NaiveDate,
        calendar_id: &str,
    ) -> Result<Vec<RemoteEvent>, Box<dyn std::error::Error + Send + Sync>>;

    async fn create_event(
        &self,
        calendar_id: &str,
        request: &EventCreateRequest,
    ) -> Result<CreatedEvent, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct GoogleCalendarService {
    access_token: String,
}

impl GoogleCalendarService {
    pub fn new(access_token: String) -> Self {
        Self { access_token }
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarService {
    async fn events_for_day(
        &self,
        day: NaiveDate,
        calendar_id: &str,
    ) -> Result<Vec<RemoteEvent>, Box<dyn std::error::Error + Send + Sync>> {
        calendar_client::list_events_for_day(&self.access_token, calendar_id, day).await
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        request: &EventCreateRequest,
    ) -> Result<CreatedEvent, Box<dyn std::error::Error + Send + Sync>> {
        calendar_client::create_event(&self.access_token, calendar_id, request).await
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        calendar_client::delete_event(&self.access_token, calendar_id, event_id).await
    }
}
