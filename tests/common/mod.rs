//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use inbox_agent::error::Result;
use inbox_agent::llm::LlmProvider;
use inbox_agent::models::{Email, Event, EventKind, EventStatus, Task, TaskStatus};
use mockall::mock;

/// Markers that identify which built-in template produced a prompt
pub const CATEGORIZE_MARKER: &str = "You categorize emails";
pub const TASKS_MARKER: &str = "You extract action items";
pub const EVENTS_MARKER: &str = "You extract meetings and deadlines";

/// Create a test email with default values
pub fn make_email(id: &str, sender: &str, subject: &str) -> Email {
    Email {
        id: id.to_string(),
        sender: sender.to_string(),
        sender_name: "Test Sender".to_string(),
        subject: subject.to_string(),
        body: format!("Body of {}", subject),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap(),
        labels: vec!["INBOX".to_string()],
        has_attachments: false,
        attachments: vec![],
        category: None,
        priority: None,
        is_read: false,
        thread_id: None,
    }
}

pub fn make_task(id: &str, due: Option<NaiveDate>) -> Task {
    Task {
        task_id: id.to_string(),
        title: format!("Task {}", id),
        due_date: due,
        source_email_id: "mock_1".to_string(),
        status: TaskStatus::Todo,
        notes: None,
        priority: None,
    }
}

pub fn make_event(id: &str, date: NaiveDate, status: EventStatus) -> Event {
    Event {
        event_id: id.to_string(),
        kind: EventKind::Meeting,
        title: format!("Event {}", id),
        date,
        start_time: Some("10:00".to_string()),
        end_time: None,
        all_day: false,
        location: None,
        participants: vec![],
        source_email_id: "mock_2".to_string(),
        confidence: 0.8,
        status,
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Mock implementation of LlmProvider for testing
mock! {
    pub Provider {}

    #[async_trait::async_trait]
    impl LlmProvider for Provider {
        async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String>;
        fn name(&self) -> &'static str;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_email() {
        let email = make_email("mock_1", "a@example.com", "Hello");
        assert_eq!(email.id, "mock_1");
        assert_eq!(email.sender, "a@example.com");
        assert!(!email.is_categorized());
    }

    #[test]
    fn test_make_event_is_timed() {
        let event = make_event("ev1", ymd(2024, 3, 10), EventStatus::Suggested);
        assert!(!event.all_day);
        assert!(event.start().is_some());
    }
}
