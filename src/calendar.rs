//! Calendar entries for confirmed events and dated tasks

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use google_calendar3::api::{Event as CalendarEvent, EventAttendee, EventDateTime};

use crate::auth::{initialize_calendar_hub, CalendarHub, CALENDAR_SCOPES};
use crate::config::CalendarConfig;
use crate::error::{AgentError, Result};
use crate::models::{Event, EventKind, Task};

/// Somewhere tasks and events can be written as calendar entries
#[async_trait]
pub trait CalendarSink: Send + Sync {
    /// All-day entry on the due date; `None` when the task has no due date
    async fn add_task(&self, task: &Task) -> Result<Option<String>>;

    async fn add_event(&self, event: &Event) -> Result<String>;
}

pub struct GoogleCalendarClient {
    hub: CalendarHub,
    calendar_id: String,
}

impl GoogleCalendarClient {
    pub fn new(hub: CalendarHub, calendar_id: &str) -> Self {
        Self {
            hub,
            calendar_id: calendar_id.to_string(),
        }
    }

    pub async fn connect(config: &CalendarConfig) -> Result<Self> {
        let hub = initialize_calendar_hub(&config.credentials_file, &config.token_file).await?;
        Ok(Self::new(hub, &config.calendar_id))
    }

    async fn insert(&self, body: CalendarEvent) -> Result<String> {
        let (_, created) = self
            .hub
            .events()
            .insert(body, &self.calendar_id)
            .add_scope(CALENDAR_SCOPES[0])
            .doit()
            .await
            .map_err(|e| AgentError::Calendar(e.to_string()))?;

        created
            .id
            .ok_or_else(|| AgentError::Calendar("Created entry has no id".to_string()))
    }
}

#[async_trait]
impl CalendarSink for GoogleCalendarClient {
    async fn add_task(&self, task: &Task) -> Result<Option<String>> {
        let Some(body) = task_entry(task) else {
            tracing::debug!("Task {} has no due date, not added to calendar", task.task_id);
            return Ok(None);
        };
        let id = self.insert(body).await?;
        tracing::info!("Added task '{}' to calendar ({})", task.title, id);
        Ok(Some(id))
    }

    async fn add_event(&self, event: &Event) -> Result<String> {
        let id = self.insert(event_entry(event)).await?;
        tracing::info!("Added event '{}' to calendar ({})", event.title, id);
        Ok(id)
    }
}

pub fn task_entry(task: &Task) -> Option<CalendarEvent> {
    let due = task.due_date?;
    let mut description = task.notes.clone().unwrap_or_default();
    if !description.is_empty() {
        description.push_str("\n\n");
    }
    description.push_str(&format!("Source email: {}", task.source_email_id));

    Some(CalendarEvent {
        summary: Some(format!("Task: {}", task.title)),
        description: Some(description),
        start: Some(all_day(due)),
        end: Some(all_day(due + Duration::days(1))),
        ..Default::default()
    })
}

/// Timed when a start time is known, otherwise all-day
pub fn event_entry(event: &Event) -> CalendarEvent {
    let (start, end) = match event.start().filter(|_| !event.all_day) {
        Some(start) => {
            let end = event
                .end()
                .filter(|end| *end > start)
                .unwrap_or_else(|| default_end(start));
            (timed(event.date, start), timed(event.date, end))
        }
        None => (all_day(event.date), all_day(event.date + Duration::days(1))),
    };

    let kind = match event.kind {
        EventKind::Meeting => "Meeting",
        EventKind::Deadline => "Deadline",
    };

    let attendees: Vec<EventAttendee> = event
        .participants
        .iter()
        .filter(|p| looks_like_address(p))
        .map(|p| EventAttendee {
            email: Some(p.clone()),
            ..Default::default()
        })
        .collect();

    CalendarEvent {
        summary: Some(event.title.clone()),
        description: Some(format!(
            "{} extracted from email {}",
            kind, event.source_email_id
        )),
        location: event.location.clone(),
        start: Some(start),
        end: Some(end),
        attendees: if attendees.is_empty() {
            None
        } else {
            Some(attendees)
        },
        ..Default::default()
    }
}

/// One hour after `start`, but not past 23:00 unless the start already is
fn default_end(start: NaiveTime) -> NaiveTime {
    let cap = NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(start);
    let (one_hour_later, wrapped) = start.overflowing_add_signed(Duration::hours(1));
    if wrapped != 0 || one_hour_later > cap {
        if start >= cap {
            NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(start)
        } else {
            cap
        }
    } else {
        one_hour_later
    }
}

fn looks_like_address(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

fn all_day(date: NaiveDate) -> EventDateTime {
    EventDateTime {
        date: Some(date),
        ..Default::default()
    }
}

/// Wall-clock time in the local zone
fn timed(date: NaiveDate, time: NaiveTime) -> EventDateTime {
    let naive = date.and_time(time);
    let utc: DateTime<Utc> = Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive));

    EventDateTime {
        date_time: Some(utc),
        ..Default::default()
    }
}
