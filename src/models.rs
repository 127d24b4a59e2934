use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Email {
    pub id: String,
    pub sender: String,
    pub sender_name: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub attachments: Vec<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl Email {
    /// Store a categorization result; category and priority are always written together
    pub fn apply_category(&mut self, result: &CategoryResult) {
        self.category = Some(result.category);
        self.priority = Some(result.priority);
    }

    pub fn is_categorized(&self) -> bool {
        self.category.is_some() && self.priority.is_some()
    }

    /// Attachment file names, in order
    pub fn attachment_names(&self) -> Vec<String> {
        self.attachments
            .iter()
            .filter_map(|a| a.get("name").and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Work,
    Personal,
    #[serde(rename = "To-Do")]
    ToDo,
    Newsletter,
    Spam,
    Meeting,
    Deadline,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Work,
        Category::Personal,
        Category::ToDo,
        Category::Newsletter,
        Category::Spam,
        Category::Meeting,
        Category::Deadline,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::ToDo => "To-Do",
            Category::Newsletter => "Newsletter",
            Category::Spam => "Spam",
            Category::Meeting => "Meeting",
            Category::Deadline => "Deadline",
            Category::Other => "Other",
        }
    }

    /// Lenient mapping for model output; anything unrecognized lands in `Other`
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "work" => Category::Work,
            "personal" => Category::Personal,
            "todo" => Category::ToDo,
            "newsletter" | "newsletters" => Category::Newsletter,
            "spam" => Category::Spam,
            "meeting" | "meetings" => Category::Meeting,
            "deadline" | "deadlines" => Category::Deadline,
            _ => Category::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" => Ok(Priority::High),
            "medium" | "normal" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(AgentError::Parse(format!("Unknown priority '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub source_email_id: String,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").replace('-', "_").as_str() {
            "todo" | "to_do" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(AgentError::Parse(format!("Unknown task status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub event_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub date: NaiveDate,
    /// HH:MM, only meaningful when `all_day` is false
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub all_day: bool,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub source_email_id: String,
    pub confidence: f32,
    pub status: EventStatus,
}

impl Event {
    pub fn start(&self) -> Option<NaiveTime> {
        self.start_time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
    }

    pub fn end(&self) -> Option<NaiveTime> {
        self.end_time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Meeting,
    Deadline,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Meeting => f.write_str("meeting"),
            EventKind::Deadline => f.write_str("deadline"),
        }
    }
}

/// Review lifecycle: `Suggested` -> `Confirmed` | `Ignored`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Suggested,
    Confirmed,
    Ignored,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Suggested => f.write_str("suggested"),
            EventStatus::Confirmed => f.write_str("confirmed"),
            EventStatus::Ignored => f.write_str("ignored"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub email_id: String,
    pub reminder_time: DateTime<Utc>,
    pub note: String,
    pub status: ReminderStatus,
}

impl Reminder {
    pub fn new(email_id: &str, reminder_time: DateTime<Utc>, note: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email_id: email_id.to_string(),
            reminder_time,
            note: note.into(),
            status: ReminderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Done,
}

/// Quick reminder choices offered next to an email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPreset {
    TodayEvening,
    TomorrowMorning,
    NextWeek,
}

impl ReminderPreset {
    /// Resolve the preset against a local wall-clock time
    pub fn resolve(&self, now: DateTime<Local>) -> DateTime<Utc> {
        let today = now.date_naive();
        let local = match self {
            ReminderPreset::TodayEvening => at_local(today, 18, 0).unwrap_or(now),
            ReminderPreset::TomorrowMorning => {
                at_local(today + Duration::days(1), 9, 0).unwrap_or(now + Duration::days(1))
            }
            ReminderPreset::NextWeek => now + Duration::days(7),
        };
        local.with_timezone(&Utc)
    }
}

impl fmt::Display for ReminderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReminderPreset::TodayEvening => "today-evening",
            ReminderPreset::TomorrowMorning => "tomorrow-morning",
            ReminderPreset::NextWeek => "next-week",
        };
        f.write_str(label)
    }
}

impl FromStr for ReminderPreset {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "today-evening" | "tonight" => Ok(ReminderPreset::TodayEvening),
            "tomorrow-morning" | "tomorrow" => Ok(ReminderPreset::TomorrowMorning),
            "next-week" => Ok(ReminderPreset::NextWeek),
            other => Err(AgentError::Parse(format!(
                "Unknown reminder preset '{}'. Use today-evening, tomorrow-morning or next-week",
                other
            ))),
        }
    }
}

fn at_local(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub recipient: Option<String>,
    /// Absent for a new email, present for a reply
    pub reply_to_email_id: Option<String>,
    pub tone: Tone,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub suggested_followups: Vec<String>,
    pub status: DraftStatus,
}

impl Draft {
    pub fn is_reply(&self) -> bool {
        self.reply_to_email_id.is_some()
    }
}

/// `Sent` exists for the taxonomy only; nothing in this crate sends mail
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    Draft,
    Saved,
    Sent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Tone {
    Formal,
    Friendly,
    Concise,
    #[default]
    Professional,
    Casual,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Formal => "Formal",
            Tone::Friendly => "Friendly",
            Tone::Concise => "Concise",
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
        };
        f.write_str(name)
    }
}

impl FromStr for Tone {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "friendly" => Ok(Tone::Friendly),
            "concise" => Ok(Tone::Concise),
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            other => Err(AgentError::Parse(format!("Unknown tone '{}'", other))),
        }
    }
}

/// Transient categorization outcome, applied to an Email and then dropped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryResult {
    pub category: Category,
    pub priority: Priority,
    pub confidence: f32,
    pub reasoning: Option<String>,
}

/// Model feedback on a draft reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToneReview {
    #[serde(default)]
    pub tone_appropriate: bool,
    #[serde(default)]
    pub is_polite: bool,
    #[serde(default)]
    pub all_questions_answered: bool,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email() -> Email {
        Email {
            id: "mock_1".to_string(),
            sender: "team.lead@company.com".to_string(),
            sender_name: "John Martinez".to_string(),
            subject: "Team Meeting Tomorrow at 2 PM".to_string(),
            body: "Agenda attached".to_string(),
            timestamp: Utc::now(),
            labels: vec!["Meeting".to_string()],
            has_attachments: false,
            attachments: Vec::new(),
            category: None,
            priority: None,
            is_read: false,
            thread_id: None,
        }
    }

    #[test]
    fn test_apply_category_sets_both_fields() {
        let mut email = sample_email();
        assert!(!email.is_categorized());

        email.apply_category(&CategoryResult {
            category: Category::Meeting,
            priority: Priority::High,
            confidence: 0.9,
            reasoning: None,
        });
        assert_eq!(email.category, Some(Category::Meeting));
        assert_eq!(email.priority, Some(Priority::High));

        // Reprocessing overwrites
        email.apply_category(&CategoryResult {
            category: Category::Work,
            priority: Priority::Low,
            confidence: 0.4,
            reasoning: None,
        });
        assert_eq!(email.category, Some(Category::Work));
        assert_eq!(email.priority, Some(Priority::Low));
    }

    #[test]
    fn test_category_from_label() {
        assert_eq!(Category::from_label("Work"), Category::Work);
        assert_eq!(Category::from_label("to-do"), Category::ToDo);
        assert_eq!(Category::from_label("TODO"), Category::ToDo);
        assert_eq!(Category::from_label("Newsletter"), Category::Newsletter);
        assert_eq!(Category::from_label("Finance"), Category::Other);
    }

    #[test]
    fn test_category_serializes_with_display_names() {
        let json = serde_json::to_string(&Category::ToDo).unwrap();
        assert_eq!(json, "\"To-Do\"");
        let parsed: Category = serde_json::from_str("\"To-Do\"").unwrap();
        assert_eq!(parsed, Category::ToDo);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("critical-ish".parse::<Priority>().is_err());
    }

    #[test]
    fn test_task_status_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
    }

    #[test]
    fn test_event_serializes_type_field() {
        let event = Event {
            event_id: "event_mock_2_0".to_string(),
            kind: EventKind::Meeting,
            title: "Team Meeting".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            start_time: Some("14:00".to_string()),
            end_time: None,
            all_day: false,
            location: Some("Conference Room B".to_string()),
            participants: vec![],
            source_email_id: "mock_2".to_string(),
            confidence: 0.8,
            status: EventStatus::Suggested,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "meeting");
        assert_eq!(value["status"], "suggested");
        assert_eq!(value["date"], "2024-03-10");
        assert_eq!(event.start(), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(event.end(), None);
    }

    #[test]
    fn test_reminder_presets() {
        let now = Local.with_ymd_and_hms(2024, 3, 10, 11, 30, 0).unwrap();

        let evening = ReminderPreset::TodayEvening.resolve(now).with_timezone(&Local);
        assert_eq!(evening.date_naive(), now.date_naive());
        assert_eq!(evening.format("%H:%M").to_string(), "18:00");

        let morning = ReminderPreset::TomorrowMorning.resolve(now).with_timezone(&Local);
        assert_eq!(morning.date_naive(), now.date_naive() + Duration::days(1));
        assert_eq!(morning.format("%H:%M").to_string(), "09:00");

        let next_week = ReminderPreset::NextWeek.resolve(now);
        assert_eq!(next_week, (now + Duration::days(7)).with_timezone(&Utc));
    }

    #[test]
    fn test_reminder_preset_parse() {
        assert_eq!("tomorrow_morning".parse::<ReminderPreset>().unwrap(), ReminderPreset::TomorrowMorning);
        assert_eq!("Next-Week".parse::<ReminderPreset>().unwrap(), ReminderPreset::NextWeek);
        assert_eq!(ReminderPreset::TodayEvening.to_string(), "today-evening");
        assert!("someday".parse::<ReminderPreset>().is_err());
    }

    #[test]
    fn test_reminder_new_is_pending() {
        let reminder = Reminder::new("mock_1", Utc::now(), "Reply to Dr. Smith");
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.email_id, "mock_1");
        assert!(!reminder.id.is_empty());
    }

    #[test]
    fn test_attachment_names() {
        let mut email = sample_email();
        let mut attachment = HashMap::new();
        attachment.insert("name".to_string(), serde_json::json!("project_guidelines.pdf"));
        attachment.insert("type".to_string(), serde_json::json!("application/pdf"));
        email.attachments.push(attachment);
        email.has_attachments = true;

        assert_eq!(email.attachment_names(), vec!["project_guidelines.pdf".to_string()]);
    }

    #[test]
    fn test_tone_roundtrip_names() {
        assert_eq!("friendly".parse::<Tone>().unwrap(), Tone::Friendly);
        assert_eq!(Tone::Professional.to_string(), "Professional");
        assert_eq!(Tone::default(), Tone::Professional);
    }
}
