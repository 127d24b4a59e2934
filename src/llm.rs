//! LLM access: the provider seam, the HTTP providers and the typed capabilities
//!
//! A provider only knows how to turn a prompt into text. [`LlmClient`] renders
//! prompt templates, calls the provider and converts the reply into typed
//! records. Every conversion is fallible; a reply that does not match the
//! expected shape is a [`AgentError::Parse`], never a half-filled record.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::date_utils::{normalize_time, parse_date};
use crate::error::{AgentError, Result};
use crate::models::{
    Category, CategoryResult, Email, Event, EventKind, EventStatus, Priority, Task, TaskStatus,
    Tone, ToneReview,
};
use crate::prompts::{render, ASK_EMAIL_PROMPT, FOLLOWUP_PROMPT};
use crate::state::InboxContext;

const SYSTEM_MESSAGE: &str =
    "You are a helpful email assistant. Always respond with valid JSON when requested.";

pub const CATEGORIZE_TEMPERATURE: f32 = 0.3;
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;
pub const REPLY_TEMPERATURE: f32 = 0.7;
pub const COMPOSE_TEMPERATURE: f32 = 0.7;
pub const FOLLOWUP_TEMPERATURE: f32 = 0.6;
pub const EXPLAIN_TEMPERATURE: f32 = 0.5;
pub const TONE_CHECK_TEMPERATURE: f32 = 0.3;
pub const SENDER_CONTEXT_TEMPERATURE: f32 = 0.5;
pub const INBOX_QUERY_TEMPERATURE: f32 = 0.6;
pub const ASK_EMAIL_TEMPERATURE: f32 = 0.7;

/// Body limit for the explanation and tone-check prompts
const SHORT_BODY_LIMIT: usize = 1000;
/// Body limit per email in the sender history
const HISTORY_BODY_LIMIT: usize = 200;
pub const MAX_SENDER_HISTORY: usize = 5;
const MAX_FOLLOWUPS: usize = 3;
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Text generation backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Local Ollama server, non-streaming chat endpoint
pub struct OllamaProvider {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(http_client: Client, base_url: &str, model: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request_body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
            "stream": false,
            "options": {"temperature": temperature},
        });

        tracing::debug!("Ollama request to {} (model {})", url, self.model);

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!(
                "Ollama API error (status {}): {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await?;
        response_json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AgentError::Parse("Ollama response has no message content".to_string()))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// OpenAI-compatible chat completions endpoint
pub struct OpenAiProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(http_client: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request_body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
            "temperature": temperature,
        });

        if prompt.to_uppercase().contains("JSON") {
            request_body["response_format"] = json!({"type": "json_object"});
        }

        tracing::debug!("OpenAI request to {} (model {})", url, self.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!(
                "OpenAI API error (status {}): {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await?;
        response_json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AgentError::Parse("OpenAI response has no choices".to_string()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Pick the provider named by the configuration
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let provider: Arc<dyn LlmProvider> = match config.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(
            http_client,
            &config.ollama_base_url,
            &config.model,
        )),
        "openai" => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                AgentError::Config("OpenAI provider requires an API key".to_string())
            })?;
            Arc::new(OpenAiProvider::new(
                http_client,
                &config.openai_base_url,
                api_key,
                &config.openai_model,
            ))
        }
        other => {
            return Err(AgentError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            )))
        }
    };

    tracing::info!("Using LLM provider: {}", provider.name());
    Ok(provider)
}

/// Typed LLM capabilities over a provider
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    body_char_limit: usize,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LlmProvider>, body_char_limit: usize) -> Self {
        Self {
            provider,
            body_char_limit,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let text = self.provider.generate_text(prompt, temperature).await?;
        tracing::debug!("{} returned {} chars", self.provider.name(), text.len());
        Ok(text)
    }

    fn email_values<'a>(&self, email: &'a Email, body: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("sender", email.sender.as_str()),
            ("subject", email.subject.as_str()),
            ("body", body),
            ("email_id", email.id.as_str()),
        ]
    }

    pub async fn categorize_email(&self, email: &Email, template: &str) -> Result<CategoryResult> {
        let body = truncate_chars(&email.body, self.body_char_limit);
        let prompt = render(template, &self.email_values(email, &body))?;
        let text = self.complete(&prompt, CATEGORIZE_TEMPERATURE).await?;
        parse_category(&parse_json(&text)?)
    }

    pub async fn extract_tasks(&self, email: &Email, template: &str) -> Result<Vec<Task>> {
        let body = truncate_chars(&email.body, self.body_char_limit);
        let prompt = render(template, &self.email_values(email, &body))?;
        let text = self.complete(&prompt, EXTRACTION_TEMPERATURE).await?;
        parse_tasks(&parse_json(&text)?, &email.id)
    }

    pub async fn extract_events(&self, email: &Email, template: &str) -> Result<Vec<Event>> {
        let body = truncate_chars(&email.body, self.body_char_limit);
        let prompt = render(template, &self.email_values(email, &body))?;
        let text = self.complete(&prompt, EXTRACTION_TEMPERATURE).await?;
        parse_events(&parse_json(&text)?, &email.id)
    }

    pub async fn generate_reply(
        &self,
        email: &Email,
        template: &str,
        tone: Tone,
        instructions: Option<&str>,
    ) -> Result<String> {
        let body = truncate_chars(&email.body, self.body_char_limit);
        let tone = tone.to_string();
        let prompt = render(
            template,
            &[
                ("sender", email.sender.as_str()),
                ("subject", email.subject.as_str()),
                ("body", body.as_str()),
                ("user_instructions", instructions.unwrap_or("None")),
                ("tone", tone.as_str()),
            ],
        )?;
        let text = self.complete(&prompt, REPLY_TEMPERATURE).await?;
        non_empty(text, "reply")
    }

    pub async fn compose_email(
        &self,
        template: &str,
        recipient: &str,
        subject: &str,
        requirements: &str,
        tone: Tone,
    ) -> Result<String> {
        let tone = tone.to_string();
        let prompt = render(
            template,
            &[
                ("user_requirements", requirements),
                ("recipient", recipient),
                ("tone", tone.as_str()),
                ("subject", subject),
            ],
        )?;
        let text = self.complete(&prompt, COMPOSE_TEMPERATURE).await?;
        non_empty(text, "draft")
    }

    pub async fn suggest_followups(&self, subject: &str, body: &str) -> Result<Vec<String>> {
        let body = truncate_chars(body, self.body_char_limit);
        let prompt = render(
            FOLLOWUP_PROMPT,
            &[("subject", subject), ("body", body.as_str())],
        )?;
        let text = self.complete(&prompt, FOLLOWUP_TEMPERATURE).await?;
        parse_followups(&parse_json(&text)?)
    }

    pub async fn explain_decision(
        &self,
        email: &Email,
        template: &str,
        tasks: &[Task],
        events: &[Event],
    ) -> Result<String> {
        let body = truncate_chars(&email.body, SHORT_BODY_LIMIT);
        let category = email
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Not categorized".to_string());
        let priority = email
            .priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "Not set".to_string());
        let tasks = summarize_titles(tasks.iter().map(|t| t.title.as_str()));
        let events = summarize_titles(events.iter().map(|e| e.title.as_str()));

        let prompt = render(
            template,
            &[
                ("sender", email.sender.as_str()),
                ("subject", email.subject.as_str()),
                ("body", body.as_str()),
                ("category", category.as_str()),
                ("priority", priority.as_str()),
                ("tasks", tasks.as_str()),
                ("events", events.as_str()),
            ],
        )?;
        let text = self.complete(&prompt, EXPLAIN_TEMPERATURE).await?;
        non_empty(text, "explanation")
    }

    pub async fn check_reply_tone(
        &self,
        email: &Email,
        template: &str,
        draft_reply: &str,
        requested_tone: Tone,
    ) -> Result<ToneReview> {
        let body = truncate_chars(&email.body, SHORT_BODY_LIMIT);
        let tone = requested_tone.to_string();
        let prompt = render(
            template,
            &[
                ("sender", email.sender.as_str()),
                ("subject", email.subject.as_str()),
                ("original_body", body.as_str()),
                ("draft_reply", draft_reply),
                ("requested_tone", tone.as_str()),
            ],
        )?;
        let text = self.complete(&prompt, TONE_CHECK_TEMPERATURE).await?;
        let value = parse_json(&text)?;
        if !value.is_object() {
            return Err(AgentError::Parse(
                "Tone review must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Summarize a sender from up to five of their other emails
    pub async fn sender_context(
        &self,
        email: &Email,
        template: &str,
        history: &[Email],
    ) -> Result<String> {
        let recent = history
            .iter()
            .take(MAX_SENDER_HISTORY)
            .map(|e| {
                format!(
                    "- {} ({}): {}",
                    e.subject,
                    e.timestamp.format("%Y-%m-%d"),
                    truncate_chars(&e.body, HISTORY_BODY_LIMIT)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let recent = if recent.is_empty() {
            "No other emails from this sender.".to_string()
        } else {
            recent
        };

        let prompt = render(
            template,
            &[
                ("sender_name", email.sender_name.as_str()),
                ("sender_email", email.sender.as_str()),
                ("recent_emails", recent.as_str()),
            ],
        )?;
        let text = self.complete(&prompt, SENDER_CONTEXT_TEMPERATURE).await?;
        non_empty(text, "sender context")
    }

    pub async fn answer_inbox_query(
        &self,
        template: &str,
        query: &str,
        context: &InboxContext,
    ) -> Result<String> {
        let total = context.total_emails.to_string();
        let unread = context.unread_count.to_string();
        let categories = context.categories_line();
        let prompt = render(
            template,
            &[
                ("query", query),
                ("total_emails", total.as_str()),
                ("unread_count", unread.as_str()),
                ("categories", categories.as_str()),
                ("tasks_summary", context.tasks_summary.as_str()),
                ("events_summary", context.events_summary.as_str()),
            ],
        )?;
        let text = self.complete(&prompt, INBOX_QUERY_TEMPERATURE).await?;
        non_empty(text, "answer")
    }

    pub async fn ask_about_email(&self, email: &Email, question: &str) -> Result<String> {
        let body = truncate_chars(&email.body, self.body_char_limit);
        let date = email.timestamp.format("%Y-%m-%d %H:%M").to_string();
        let prompt = render(
            ASK_EMAIL_PROMPT,
            &[
                ("sender", email.sender.as_str()),
                ("subject", email.subject.as_str()),
                ("date", date.as_str()),
                ("body", body.as_str()),
                ("question", question),
            ],
        )?;
        let text = self.complete(&prompt, ASK_EMAIL_TEMPERATURE).await?;
        non_empty(text, "answer")
    }
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn summarize_titles<'a>(titles: impl Iterator<Item = &'a str>) -> String {
    let joined = titles.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

fn non_empty(text: String, what: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AgentError::Parse(format!("Model returned an empty {}", what)));
    }
    Ok(trimmed.to_string())
}

/// Remove a surrounding markdown code fence, with or without a language tag
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Parse model output as JSON
///
/// Code fences are stripped first. If the remaining text still is not JSON,
/// the span opened by the earliest `[` or `{` is tried, then the first span of
/// the other kind, before giving up.
pub fn parse_json(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Ok(value);
    }

    let mut starts: Vec<usize> = ['[', '{']
        .iter()
        .filter_map(|open| cleaned.find(*open))
        .collect();
    starts.sort_unstable();

    for start in starts {
        if let Some(span) = balanced_span(&cleaned[start..]) {
            if let Ok(value) = serde_json::from_str::<Value>(span) {
                return Ok(value);
            }
        }
    }

    let preview = truncate_chars(cleaned, 80);
    Err(AgentError::Parse(format!("No JSON found in model output: {}", preview)))
}

/// The bracketed span at the start of `text`, up to its matching close
///
/// Brackets inside JSON strings are ignored.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// A single object where a list is expected counts as a one-element list
fn as_list(value: &Value) -> Result<Vec<&Value>> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![value]),
        other => Err(AgentError::Parse(format!("Expected a JSON array, got {}", other))),
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn confidence_field(item: &Value) -> f32 {
    item.get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

pub fn parse_category(value: &Value) -> Result<CategoryResult> {
    if !value.is_object() {
        return Err(AgentError::Parse(
            "Categorization must be a JSON object".to_string(),
        ));
    }

    let category = str_field(value, "category")
        .map(Category::from_label)
        .unwrap_or(Category::Other);
    let priority = match str_field(value, "priority") {
        Some(p) => p.parse::<Priority>()?,
        None => Priority::Medium,
    };

    Ok(CategoryResult {
        category,
        priority,
        confidence: confidence_field(value),
        reasoning: str_field(value, "reasoning").map(str::to_string),
    })
}

/// Build tasks for `email_id`; ids are `task_{email_id}_{n}`
pub fn parse_tasks(value: &Value, email_id: &str) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();

    for item in as_list(value)? {
        if !item.is_object() {
            return Err(AgentError::Parse(format!("Task entry is not an object: {}", item)));
        }
        let Some(title) = str_field(item, "title") else {
            tracing::warn!("Skipping task without title from email {}", email_id);
            continue;
        };

        let status = str_field(item, "status")
            .and_then(|s| s.parse::<TaskStatus>().ok())
            .unwrap_or_default();

        tasks.push(Task {
            task_id: format!("task_{}_{}", email_id, tasks.len()),
            title: title.to_string(),
            due_date: str_field(item, "due_date").and_then(parse_date),
            source_email_id: email_id.to_string(),
            status,
            notes: str_field(item, "notes").map(str::to_string),
            priority: str_field(item, "priority").and_then(|p| p.parse().ok()),
        });
    }

    Ok(tasks)
}

/// Build suggested events for `email_id`; ids are `event_{email_id}_{n}`
pub fn parse_events(value: &Value, email_id: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for item in as_list(value)? {
        if !item.is_object() {
            return Err(AgentError::Parse(format!("Event entry is not an object: {}", item)));
        }
        let Some(title) = str_field(item, "title") else {
            tracing::warn!("Skipping event without title from email {}", email_id);
            continue;
        };
        let Some(date) = str_field(item, "date").and_then(parse_date) else {
            tracing::warn!(
                "Dropping event '{}' from email {}: missing or unparseable date",
                title,
                email_id
            );
            continue;
        };

        let kind = match str_field(item, "type").map(str::to_lowercase).as_deref() {
            Some("deadline") => EventKind::Deadline,
            _ => EventKind::Meeting,
        };
        let start_time = str_field(item, "start_time").and_then(normalize_time);
        let end_time = str_field(item, "end_time").and_then(normalize_time);
        let all_day = item
            .get("all_day")
            .and_then(Value::as_bool)
            .unwrap_or(start_time.is_none());
        let participants = item
            .get("participants")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        events.push(Event {
            event_id: format!("event_{}_{}", email_id, events.len()),
            kind,
            title: title.to_string(),
            date,
            start_time: if all_day { None } else { start_time },
            end_time: if all_day { None } else { end_time },
            all_day,
            location: str_field(item, "location").map(str::to_string),
            participants,
            source_email_id: email_id.to_string(),
            confidence: confidence_field(item),
            status: EventStatus::Suggested,
        });
    }

    Ok(events)
}

/// Follow-ups may come back as strings or as objects wrapping a string
pub fn parse_followups(value: &Value) -> Result<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(AgentError::Parse(
                "Follow-up suggestions must be a JSON array".to_string(),
            ))
        }
    };

    let suggestions = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(map) => ["suggestion", "text", "followup"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .or_else(|| map.values().find_map(Value::as_str))
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .take(MAX_FOLLOWUPS)
        .collect();

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns a canned reply and remembers the last prompt
    struct CannedProvider {
        reply: String,
        last_prompt: Mutex<Option<(String, f32)>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some((prompt.to_string(), temperature));
            Ok(self.reply.clone())
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn email() -> Email {
        Email {
            id: "mock_2".to_string(),
            sender: "client@example.com".to_string(),
            sender_name: "Sarah Johnson".to_string(),
            subject: "Project Deadline".to_string(),
            body: "Please send the report by March 15th, 2024.".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap(),
            labels: vec![],
            has_attachments: false,
            attachments: vec![],
            category: None,
            priority: None,
            is_read: false,
            thread_id: None,
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_json_finds_embedded_payload() {
        let value = parse_json("Here are the tasks:\n[{\"title\": \"x\"}]\nDone.").unwrap();
        assert!(value.is_array());
        assert!(matches!(
            parse_json("I could not find anything"),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_json_prose_wrapped_object_keeps_nested_list() {
        let reply = "Here is the event: {\"type\": \"meeting\", \"title\": \"Sync\", \
                     \"date\": \"2024-03-10\", \"participants\": [\"a@b.com\"]} Let me know!";
        let value = parse_json(reply).unwrap();
        assert!(value.is_object());
        let events = parse_events(&value, "e1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Sync");
        assert_eq!(events[0].participants, vec!["a@b.com".to_string()]);

        let value =
            parse_json("Sure! {\"category\": \"Work\", \"priority\": \"High\", \"tags\": [\"q1\"]}")
                .unwrap();
        let result = parse_category(&value).unwrap();
        assert_eq!(result.category, Category::Work);
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn test_parse_json_ignores_brackets_inside_strings() {
        let value = parse_json("Result: [{\"title\": \"Fix [urgent] bug }\"}] thanks").unwrap();
        assert_eq!(value[0]["title"], "Fix [urgent] bug }");

        // A stray bracket in the prose falls through to the next candidate
        let value = parse_json("Note [see below]: {\"category\": \"Spam\"}").unwrap();
        assert_eq!(value["category"], "Spam");
    }

    #[test]
    fn test_parse_category_defaults() {
        let result = parse_category(&json!({})).unwrap();
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(result.confidence, 0.5);

        let result = parse_category(&json!({
            "category": "To-Do", "priority": "High", "confidence": 1.7, "reasoning": "asks for report"
        }))
        .unwrap();
        assert_eq!(result.category, Category::ToDo);
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.reasoning.as_deref(), Some("asks for report"));
    }

    #[test]
    fn test_parse_category_rejects_bad_shapes() {
        assert!(parse_category(&json!(["Work"])).is_err());
        assert!(parse_category(&json!({"priority": "sometime"})).is_err());
    }

    #[test]
    fn test_parse_tasks_assigns_ids_and_source() {
        let value = json!([
            {"title": "Send report", "due_date": "2024-03-15", "source_email_id": "other"},
            {"title": "Book room", "due_date": "soon", "status": "in progress"},
            {"notes": "no title"}
        ]);
        let tasks = parse_tasks(&value, "mock_2").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id, "task_mock_2_0");
        assert_eq!(tasks[0].source_email_id, "mock_2");
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(tasks[1].task_id, "task_mock_2_1");
        assert_eq!(tasks[1].due_date, None);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn test_parse_tasks_single_object_and_bad_shape() {
        let tasks = parse_tasks(&json!({"title": "Reply"}), "mock_1").unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(parse_tasks(&json!("nothing"), "mock_1").is_err());
        assert!(parse_tasks(&json!([1, 2]), "mock_1").is_err());
    }

    #[test]
    fn test_parse_events_drops_bad_dates_and_normalizes_times() {
        let value = json!([
            {"type": "meeting", "title": "Sync", "date": "2024-03-10", "start_time": "14:00:00",
             "end_time": "15:00", "participants": ["a@b.com", " "], "confidence": 0.9},
            {"type": "deadline", "title": "Report", "date": "March 15th, 2024"},
            {"type": "meeting", "title": "Lunch", "date": "next week"}
        ]);
        let events = parse_events(&value, "mock_2").unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].event_id, "event_mock_2_0");
        assert_eq!(events[0].start_time.as_deref(), Some("14:00"));
        assert!(!events[0].all_day);
        assert_eq!(events[0].participants, vec!["a@b.com".to_string()]);
        assert_eq!(events[0].status, EventStatus::Suggested);

        assert_eq!(events[1].kind, EventKind::Deadline);
        assert!(events[1].all_day);
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(events[1].confidence, 0.5);
    }

    #[test]
    fn test_parse_followups_shapes() {
        let value = json!([
            "Confirm attendance",
            {"suggestion": "Share agenda"},
            {"other": "Book a room"},
            42,
            "Fourth one"
        ]);
        let followups = parse_followups(&value).unwrap();
        assert_eq!(
            followups,
            vec!["Confirm attendance", "Share agenda", "Book a room"]
        );
        assert!(parse_followups(&json!({"a": "b"})).is_err());
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_categorize_renders_prompt_and_parses() {
        let provider = CannedProvider::new("```json\n{\"category\": \"Work\", \"priority\": \"High\"}\n```");
        let client = LlmClient::new(provider.clone(), 10);

        let result = client
            .categorize_email(&email(), "{sender}|{subject}|{body}")
            .await
            .unwrap();
        assert_eq!(result.category, Category::Work);

        let (prompt, temperature) = provider.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "client@example.com|Project Deadline|Please sen");
        assert_eq!(temperature, CATEGORIZE_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_tone_review_requires_object() {
        let client = LlmClient::new(CannedProvider::new("[]"), 2000);
        let result = client
            .check_reply_tone(&email(), "{draft_reply}", "Thanks!", Tone::Friendly)
            .await;
        assert!(matches!(result, Err(AgentError::Parse(_))));

        let client = LlmClient::new(
            CannedProvider::new(r#"{"tone_appropriate": true, "feedback": "Good"}"#),
            2000,
        );
        let review = client
            .check_reply_tone(&email(), "{draft_reply}", "Thanks!", Tone::Friendly)
            .await
            .unwrap();
        assert!(review.tone_appropriate);
        assert!(!review.is_polite);
        assert_eq!(review.feedback, "Good");
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let client = LlmClient::new(CannedProvider::new("   "), 2000);
        let result = client
            .generate_reply(&email(), "{body}", Tone::Formal, None)
            .await;
        assert!(matches!(result, Err(AgentError::Parse(_))));
    }

    #[tokio::test]
    async fn test_sender_context_limits_history() {
        let provider = CannedProvider::new("Frequent client");
        let client = LlmClient::new(provider.clone(), 2000);
        let history: Vec<Email> = (0..8)
            .map(|i| {
                let mut e = email();
                e.subject = format!("Update {}", i);
                e
            })
            .collect();

        let summary = client
            .sender_context(&email(), "{recent_emails}", &history)
            .await
            .unwrap();
        assert_eq!(summary, "Frequent client");

        let (prompt, _) = provider.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt.lines().count(), MAX_SENDER_HISTORY);
        assert!(!prompt.contains("Update 5"));
    }

    #[tokio::test]
    async fn test_ollama_provider_posts_chat_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama2:latest",
                "stream": false,
                "options": {"temperature": 0.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "hello"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(Client::new(), &server.uri(), "llama2:latest");
        let text = provider.generate_text("hi", 0.5).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_ollama_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(Client::new(), &server.uri(), "llama2:latest");
        let err = provider.generate_text("hi", 0.3).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn test_openai_provider_requests_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(Client::new(), &server.uri(), "sk-test", "gpt-4");
        let text = provider
            .generate_text("Respond in JSON format", 0.3)
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_openai_provider_missing_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(Client::new(), &server.uri(), "sk-test", "gpt-4");
        let err = provider.generate_text("plain text", 0.7).await.unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_build_provider_selection() {
        let config = LlmConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "ollama");

        let mut config = LlmConfig::default();
        config.provider = "openai".to_string();
        assert!(build_provider(&config).is_err());
        config.openai_api_key = Some("sk-test".to_string());
        assert_eq!(build_provider(&config).unwrap().name(), "openai");

        config.provider = "gemini".to_string();
        assert!(matches!(build_provider(&config), Err(AgentError::Config(_))));
    }
}
