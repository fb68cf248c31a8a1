use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use crate::service::calendar_service::{CreatedEvent, EventCreateRequest, EventMoment, RemoteEvent};

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize)]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEvent>,
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEvent {
    id: String,
    summary: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
}

#[derive(Debug, Default, Deserialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleCreatedEvent {
    id: String,
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

/// Lists the day's events ordered by start time. The window is composed
/// textually in the fixed UTC-3 offset, midnight to midnight exclusive.
pub async fn list_events_for_day(
    access_token: &str,
    calendar_id: &str,
    day: NaiveDate,
) -> Result<Vec<RemoteEvent>, Box<dyn std::error::Error + Send + Sync>> {
    let url = format!(
        "{}/calendars/{}/events",
        GOOGLE_CALENDAR_API_BASE, calendar_id
    );
    let time_min = day_boundary(day);
    let time_max = day_boundary(day + chrono::Duration::days(1));

    let response = client()?
        .get(&url)
        .bearer_auth(access_token)
        .query(&[
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Google API error ({}): {}", status, error_text).into());
    }

    let listed: GoogleEventsResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse Google response: {}", e))?;

    Ok(listed
        .items
        .into_iter()
        .map(|event| {
            let start = event.start.unwrap_or_default();
            let end = event.end.unwrap_or_default();
            RemoteEvent {
                id: event.id,
                title: event.summary.filter(|s| !s.trim().is_empty()),
                start_date_time: start.date_time,
                start_date: start.date,
                end_date_time: end.date_time,
                end_date: end.date,
            }
        })
        .collect())
}

pub async fn create_event(
    access_token: &str,
    calendar_id: &str,
    request: &EventCreateRequest,
) -> Result<CreatedEvent, Box<dyn std::error::Error + Send + Sync>> {
    let url = format!(
        "{}/calendars/{}/events",
        GOOGLE_CALENDAR_API_BASE, calendar_id
    );

    let mut body = json!({
        "summary": request.summary,
        "start": moment_json(&request.start),
        "end": moment_json(&request.end),
    });
    if let Some(description) = &request.description {
        body["description"] = json!(description);
    }
    if let Some(location) = &request.location {
        body["location"] = json!(location);
    }
    if !request.attendee_emails.is_empty() {
        body["attendees"] = json!(
            request
                .attendee_emails
                .iter()
                .map(|email| json!({ "email": email }))
                .collect::<Vec<_>>()
        );
    }

    let response = client()?
        .post(&url)
        .bearer_auth(access_token)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Google API error ({}): {}", status, error_text).into());
    }

    let created: GoogleCreatedEvent = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse Google response: {}", e))?;

    Ok(CreatedEvent {
        id: created.id,
        html_link: created.html_link,
    })
}

pub async fn delete_event(
    access_token: &str,
    calendar_id: &str,
    event_id: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let url = format!(
        "{}/calendars/{}/events/{}",
        GOOGLE_CALENDAR_API_BASE, calendar_id, event_id
    );
    let response = client()?.delete(&url).bearer_auth(access_token).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Google API error ({}): {}", status, error_text).into());
    }
    Ok(())
}

fn moment_json(moment: &EventMoment) -> serde_json::Value {
    match moment {
        EventMoment::DateTime(instant) => json!({ "dateTime": instant }),
        EventMoment::Date(date) => json!({ "date": date }),
    }
}

fn day_boundary(day: NaiveDate) -> String {
    format!(
        "{:04}-{:02}-{:02}T00:00:00-03:00",
        day.year(),
        day.month(),
        day.day()
    )
}

fn client() -> Result<reqwest::Client, Box<dyn std::error::Error + Send + Sync>> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
        .build()?)
}
