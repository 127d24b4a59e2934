//! Session state: the single owner of every record in a running session
//!
//! The store is an explicit value passed to whoever needs it. Lookups with an
//! unknown id return `None` or `false`, never an error.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, Result};
use crate::models::{
    Category, Draft, DraftStatus, Email, Event, EventStatus, Priority, Reminder, Task, TaskStatus,
};
use crate::processor::ProcessingResult;
use crate::prompts::{self, PromptMap};

const SENDER_HISTORY_LIMIT: usize = 5;
const SUMMARY_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InboxMode {
    #[default]
    Mock,
    Gmail,
}

impl fmt::Display for InboxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboxMode::Mock => f.write_str("mock"),
            InboxMode::Gmail => f.write_str("gmail"),
        }
    }
}

impl FromStr for InboxMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(InboxMode::Mock),
            "gmail" => Ok(InboxMode::Gmail),
            other => Err(AgentError::Config(format!(
                "Unknown inbox mode '{}'. Must be 'mock' or 'gmail'",
                other
            ))),
        }
    }
}

/// Inbox overview handed to the inbox-query prompt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxContext {
    pub total_emails: usize,
    pub unread_count: usize,
    pub categories: BTreeMap<String, usize>,
    pub tasks_summary: String,
    pub events_summary: String,
}

impl InboxContext {
    pub fn categories_line(&self) -> String {
        if self.categories.is_empty() {
            return "None".to_string();
        }
        self.categories
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    default_mode: InboxMode,
    mode: InboxMode,
    emails: Vec<Email>,
    tasks: Vec<Task>,
    events: Vec<Event>,
    reminders: Vec<Reminder>,
    drafts: Vec<Draft>,
    prompts: PromptMap,
    processing_cache: HashMap<String, ProcessingResult>,
    selected_email_id: Option<String>,
}

impl SessionState {
    pub fn new(default_mode: InboxMode) -> Self {
        Self {
            default_mode,
            mode: default_mode,
            emails: Vec::new(),
            tasks: Vec::new(),
            events: Vec::new(),
            reminders: Vec::new(),
            drafts: Vec::new(),
            prompts: prompts::default_prompts(),
            processing_cache: HashMap::new(),
            selected_email_id: None,
        }
    }

    /// Reset every collection and return to the default mode
    pub fn initialize(&mut self) {
        *self = Self::new(self.default_mode);
        tracing::debug!("Session state initialized in {} mode", self.mode);
    }

    /// Change inbox source; inbox-derived data is dropped, prompts and drafts stay
    pub fn switch_mode(&mut self, mode: InboxMode) {
        self.mode = mode;
        self.emails.clear();
        self.tasks.clear();
        self.events.clear();
        self.reminders.clear();
        self.processing_cache.clear();
        self.selected_email_id = None;
        tracing::info!("Switched to {} mode", mode);
    }

    pub fn mode(&self) -> InboxMode {
        self.mode
    }

    // Emails

    /// Append emails not already present; returns how many were added
    pub fn load_emails(&mut self, emails: Vec<Email>) -> usize {
        let before = self.emails.len();
        for email in emails {
            if self.get_email(&email.id).is_some() {
                tracing::warn!("Skipping email with duplicate id {}", email.id);
                continue;
            }
            self.emails.push(email);
        }
        let added = self.emails.len() - before;
        tracing::debug!("Loaded {} emails ({} total)", added, self.emails.len());
        added
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn get_email(&self, id: &str) -> Option<&Email> {
        self.emails.iter().find(|e| e.id == id)
    }

    pub fn get_email_mut(&mut self, id: &str) -> Option<&mut Email> {
        self.emails.iter_mut().find(|e| e.id == id)
    }

    pub fn select_email(&mut self, id: &str) -> bool {
        if self.get_email(id).is_some() {
            self.selected_email_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected_email(&self) -> Option<&Email> {
        self.selected_email_id
            .as_deref()
            .and_then(|id| self.get_email(id))
    }

    pub fn mark_read(&mut self, id: &str, is_read: bool) -> bool {
        match self.get_email_mut(id) {
            Some(email) => {
                email.is_read = is_read;
                true
            }
            None => false,
        }
    }

    pub fn get_high_priority_emails(&self) -> Vec<&Email> {
        self.emails
            .iter()
            .filter(|e| e.priority == Some(Priority::High) && !e.is_read)
            .collect()
    }

    pub fn get_emails_by_category(&self, category: Category) -> Vec<&Email> {
        self.emails
            .iter()
            .filter(|e| e.category == Some(category))
            .collect()
    }

    /// Case-insensitive sender address match
    pub fn get_emails_by_sender(&self, sender: &str) -> Vec<&Email> {
        self.emails
            .iter()
            .filter(|e| e.sender.eq_ignore_ascii_case(sender))
            .collect()
    }

    pub fn emails_with_attachments(&self) -> Vec<&Email> {
        self.emails.iter().filter(|e| e.has_attachments).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.emails.iter().filter(|e| !e.is_read).count()
    }

    /// Other emails from the same sender, newest first, at most five
    pub fn sender_history(&self, email_id: &str) -> Vec<&Email> {
        let Some(email) = self.get_email(email_id) else {
            return Vec::new();
        };
        let mut history: Vec<&Email> = self
            .get_emails_by_sender(&email.sender)
            .into_iter()
            .filter(|e| e.id != email_id)
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(SENDER_HISTORY_LIMIT);
        history
    }

    // Tasks

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Insert unless a task with the same id exists; returns whether it was added
    pub fn add_task(&mut self, task: Task) -> bool {
        if self.tasks.iter().any(|t| t.task_id == task.task_id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// Open tasks due on `date`
    pub fn get_tasks_by_date(&self, date: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.due_date == Some(date) && t.status != TaskStatus::Done)
            .collect()
    }

    pub fn tasks_for_email(&self, email_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.source_email_id == email_id)
            .collect()
    }

    pub fn get_tasks_due_soon(&self, days: i64) -> Vec<&Task> {
        self.get_tasks_due_soon_from(Local::now().date_naive(), days)
    }

    /// Open tasks due within `[today, today + days]`, soonest first
    pub fn get_tasks_due_soon_from(&self, today: NaiveDate, days: i64) -> Vec<&Task> {
        let Some(end) = window_end(today, days) else {
            return Vec::new();
        };
        let mut due: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done)
            .filter(|t| t.due_date.is_some_and(|d| d >= today && d <= end))
            .collect();
        due.sort_by_key(|t| t.due_date);
        due
    }

    /// Returns false when no task has this id
    pub fn update_task_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        match self.tasks.iter_mut().find(|t| t.task_id == task_id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => {
                tracing::debug!("update_task_status: no task {}", task_id);
                false
            }
        }
    }

    // Events

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn add_event(&mut self, event: Event) -> bool {
        if self.events.iter().any(|e| e.event_id == event.event_id) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn get_event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    pub fn events_for_email(&self, email_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.source_email_id == email_id)
            .collect()
    }

    pub fn suggested_events(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.status == EventStatus::Suggested)
            .collect()
    }

    /// Confirmed events on `date`
    pub fn get_events_by_date(&self, date: NaiveDate) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.status == EventStatus::Confirmed && e.date == date)
            .collect()
    }

    pub fn get_upcoming_events(&self, days: i64) -> Vec<&Event> {
        self.get_upcoming_events_from(Local::now().date_naive(), days)
    }

    /// Confirmed events within `[today, today + days]`, ascending by date
    pub fn get_upcoming_events_from(&self, today: NaiveDate, days: i64) -> Vec<&Event> {
        let Some(end) = window_end(today, days) else {
            return Vec::new();
        };
        let mut upcoming: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Confirmed)
            .filter(|e| e.date >= today && e.date <= end)
            .collect();
        upcoming.sort_by_key(|e| (e.date, e.start()));
        upcoming
    }

    pub fn confirm_event(&mut self, event_id: &str) -> bool {
        self.set_event_status(event_id, EventStatus::Confirmed)
    }

    pub fn ignore_event(&mut self, event_id: &str) -> bool {
        self.set_event_status(event_id, EventStatus::Ignored)
    }

    fn set_event_status(&mut self, event_id: &str, status: EventStatus) -> bool {
        match self.events.iter_mut().find(|e| e.event_id == event_id) {
            Some(event) => {
                event.status = status;
                true
            }
            None => false,
        }
    }

    // Reminders

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn add_reminder(&mut self, reminder: Reminder) -> bool {
        if self.reminders.iter().any(|r| r.id == reminder.id) {
            return false;
        }
        self.reminders.push(reminder);
        true
    }

    pub fn reminders_for_email(&self, email_id: &str) -> Vec<&Reminder> {
        self.reminders
            .iter()
            .filter(|r| r.email_id == email_id)
            .collect()
    }

    // Processing

    /// Store a processing outcome: category onto the email, tasks and events
    /// inserted idempotently, and the result cached by email id
    pub fn apply_processing_result(&mut self, result: ProcessingResult) {
        if let Some(category) = &result.category {
            if let Some(email) = self.get_email_mut(&result.email_id) {
                email.apply_category(category);
            }
        }
        for task in result.tasks.iter().flatten() {
            self.add_task(task.clone());
        }
        for event in result.events.iter().flatten() {
            self.add_event(event.clone());
        }
        self.processing_cache
            .insert(result.email_id.clone(), result);
    }

    pub fn cached_result(&self, email_id: &str) -> Option<&ProcessingResult> {
        self.processing_cache.get(email_id)
    }

    // Drafts

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn set_drafts(&mut self, drafts: Vec<Draft>) {
        self.drafts = drafts;
    }

    pub fn add_draft(&mut self, draft: Draft) -> bool {
        if self.drafts.iter().any(|d| d.id == draft.id) {
            return false;
        }
        self.drafts.push(draft);
        true
    }

    pub fn get_draft(&self, draft_id: &str) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.id == draft_id)
    }

    /// Edit subject and body; an edited draft counts as saved
    pub fn update_draft(&mut self, draft_id: &str, subject: &str, body: &str) -> bool {
        match self.drafts.iter_mut().find(|d| d.id == draft_id) {
            Some(draft) => {
                draft.subject = subject.to_string();
                draft.body = body.to_string();
                draft.status = DraftStatus::Saved;
                true
            }
            None => false,
        }
    }

    pub fn delete_draft(&mut self, draft_id: &str) -> bool {
        let before = self.drafts.len();
        self.drafts.retain(|d| d.id != draft_id);
        self.drafts.len() != before
    }

    // Prompts

    pub fn prompts(&self) -> &PromptMap {
        &self.prompts
    }

    pub fn set_prompts(&mut self, prompts: PromptMap) {
        self.prompts = prompts;
    }

    pub fn get_prompt(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// Replace a known template
    pub fn set_prompt(&mut self, name: &str, template: &str) -> Result<()> {
        if prompts::default_prompt(name).is_none() {
            return Err(AgentError::NotFound(format!("Unknown prompt '{}'", name)));
        }
        self.prompts.insert(name.to_string(), template.to_string());
        Ok(())
    }

    pub fn reset_prompt(&mut self, name: &str) -> Result<()> {
        let default = prompts::default_prompt(name)
            .ok_or_else(|| AgentError::NotFound(format!("Unknown prompt '{}'", name)))?;
        self.prompts.insert(name.to_string(), default.to_string());
        Ok(())
    }

    pub fn reset_prompts(&mut self) {
        self.prompts = prompts::default_prompts();
    }

    // Inbox overview

    pub fn inbox_context(&self) -> InboxContext {
        let mut categories = BTreeMap::new();
        for email in &self.emails {
            let name = email.category.map_or("Uncategorized", |c| c.as_str());
            *categories.entry(name.to_string()).or_insert(0) += 1;
        }

        let open: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done)
            .collect();
        let tasks_summary = if self.tasks.is_empty() {
            "No tasks".to_string()
        } else {
            let listed = open
                .iter()
                .take(SUMMARY_ITEMS)
                .map(|t| match t.due_date {
                    Some(due) => format!("{} (due {})", t.title, due),
                    None => t.title.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "{} total, {} open: {}",
                self.tasks.len(),
                open.len(),
                if listed.is_empty() { "none" } else { listed.as_str() }
            )
        };

        let confirmed = self
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Confirmed)
            .count();
        let events_summary = if self.events.is_empty() {
            "No events".to_string()
        } else {
            let listed = self
                .events
                .iter()
                .filter(|e| e.status != EventStatus::Ignored)
                .take(SUMMARY_ITEMS)
                .map(|e| format!("{} on {} ({})", e.title, e.date, e.status))
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "{} total, {} confirmed: {}",
                self.events.len(),
                confirmed,
                if listed.is_empty() { "none" } else { listed.as_str() }
            )
        };

        InboxContext {
            total_emails: self.emails.len(),
            unread_count: self.unread_count(),
            categories,
            tasks_summary,
            events_summary,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(InboxMode::default())
    }
}

/// Last day of a `days`-long window from `today`, saturating at the latest
/// representable date; `None` for a negative window
fn window_end(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days < 0 {
        return None;
    }
    Some(
        Duration::try_days(days)
            .and_then(|delta| today.checked_add_signed(delta))
            .unwrap_or(NaiveDate::MAX),
    )
}
