//! Prompt templates: built-in defaults, placeholder rendering and file persistence
//!
//! Templates use `{name}` placeholders. Literal braces (needed for the JSON
//! examples embedded in several prompts) are written as `{{` and `}}`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AgentError, Result};

pub type PromptMap = BTreeMap<String, String>;

pub const CATEGORIZATION: &str = "categorization";
pub const TASK_EXTRACTION: &str = "task_extraction";
pub const EVENT_EXTRACTION: &str = "event_extraction";
pub const REPLY_GENERATION: &str = "reply_generation";
pub const NEW_DRAFT_GENERATION: &str = "new_draft_generation";
pub const EXPLANATION: &str = "explanation";
pub const TONE_CHECK: &str = "tone_check";
pub const SENDER_CONTEXT: &str = "sender_context";
pub const INBOX_QUERY: &str = "inbox_query";

pub const PROMPT_NAMES: [&str; 9] = [
    CATEGORIZATION,
    TASK_EXTRACTION,
    EVENT_EXTRACTION,
    REPLY_GENERATION,
    NEW_DRAFT_GENERATION,
    EXPLANATION,
    TONE_CHECK,
    SENDER_CONTEXT,
    INBOX_QUERY,
];

pub const CATEGORIZATION_PROMPT: &str = r#"You categorize emails. Read the email below and assign a category and a priority.

Email:
From: {sender}
Subject: {subject}
Body: {body}

Respond in JSON format:
{{
    "category": "Work" | "Personal" | "To-Do" | "Newsletter" | "Spam" | "Meeting" | "Deadline" | "Other",
    "priority": "High" | "Medium" | "Low",
    "confidence": 0.0-1.0,
    "reasoning": "one sentence"
}}

Return only the JSON object."#;

pub const TASK_EXTRACTION_PROMPT: &str = r#"You extract action items from emails. Read the email below and list every task the recipient has to do.

Email:
From: {sender}
Subject: {subject}
Body: {body}

For each task give a short title, the due date if one is stated (YYYY-MM-DD) and any useful notes.

Respond in JSON format as an array:
[
    {{
        "title": "what needs to be done",
        "due_date": "YYYY-MM-DD or null",
        "source_email_id": "{email_id}",
        "status": "todo",
        "notes": "context"
    }}
]

Return [] when there are no tasks. Return only the JSON array."#;

pub const EVENT_EXTRACTION_PROMPT: &str = r#"You extract meetings and deadlines from emails. Read the email below and list every dated event.

Email:
From: {sender}
Subject: {subject}
Body: {body}

For each event give the type ("meeting" or "deadline"), a title, the date (YYYY-MM-DD), start and end time if stated (HH:MM), the location and the participants.

Respond in JSON format as an array:
[
    {{
        "type": "meeting" | "deadline",
        "title": "event title",
        "date": "YYYY-MM-DD",
        "start_time": "HH:MM or null",
        "end_time": "HH:MM or null",
        "all_day": true/false,
        "location": "string or null",
        "participants": ["email or name"],
        "source_email_id": "{email_id}",
        "confidence": 0.0-1.0
    }}
]

Return [] when there are no events. Return only the JSON array."#;

pub const REPLY_GENERATION_PROMPT: &str = r#"You draft email replies. Write a reply to the email below.

Original Email:
From: {sender}
Subject: {subject}
Body: {body}

User Instructions: {user_instructions}

Tone: {tone}

The reply must answer every point raised, match the {tone} tone, stay polite and be as short as it can while complete.

Return only the reply text."#;

pub const NEW_DRAFT_GENERATION_PROMPT: &str = r#"You compose emails. Write a new email from the requirements below.

User Requirements:
{user_requirements}

Recipient: {recipient}
Tone: {tone}
Subject: {subject}

The email must match the {tone} tone, stay polite, be clearly structured and include everything the requirements ask for.

Return only the email body."#;

pub const EXPLANATION_PROMPT: &str = r#"Explain how this email was processed.

Email:
From: {sender}
Subject: {subject}
Body: {body}

Category: {category}
Priority: {priority}
Extracted Tasks: {tasks}
Extracted Events: {events}

Briefly explain why the category and priority were chosen and why these tasks and events were identified."#;

pub const TONE_CHECK_PROMPT: &str = r#"Review this reply draft for tone and completeness.

Original Email:
From: {sender}
Subject: {subject}
Body: {original_body}

Draft Reply:
{draft_reply}

Requested Tone: {requested_tone}

Respond in JSON format:
{{
    "tone_appropriate": true/false,
    "is_polite": true/false,
    "all_questions_answered": true/false,
    "feedback": "detailed feedback",
    "suggestions": ["suggestion1", "suggestion2"]
}}

Return only the JSON object."#;

pub const SENDER_CONTEXT_PROMPT: &str = r#"Summarize what we know about this sender from the email history.

Sender: {sender_name} ({sender_email})

Recent Emails:
{recent_emails}

In two or three sentences describe the kind of emails this sender writes, the recurring topics and whether the relationship looks like work or personal."#;

pub const INBOX_QUERY_PROMPT: &str = r#"You are an inbox assistant. The user asked: "{query}"

Inbox overview:
- Total emails: {total_emails}
- Unread emails: {unread_count}
- Categories: {categories}
- Tasks: {tasks_summary}
- Events: {events_summary}

Answer the question from this overview. List specific emails, tasks or events when asked for them and keep summaries short.

Respond conversationally."#;

/// Prompt used for follow-up suggestions after a draft is generated
pub const FOLLOWUP_PROMPT: &str = r#"Suggest 2-3 follow-up actions or topics for this email draft.

Email Subject: {subject}
Email Body: {body}

Respond with a JSON array of short strings:
["suggestion1", "suggestion2", "suggestion3"]

Return only the JSON array."#;

/// Prompt used to answer a free-form question about a single email
pub const ASK_EMAIL_PROMPT: &str = r#"Answer the user's question about this email.

Email:
From: {sender}
Subject: {subject}
Date: {date}
Body: {body}

Question: {question}

Answer directly and briefly."#;

/// Built-in default templates, keyed by prompt name
pub fn default_prompts() -> PromptMap {
    let mut map = PromptMap::new();
    map.insert(CATEGORIZATION.to_string(), CATEGORIZATION_PROMPT.to_string());
    map.insert(TASK_EXTRACTION.to_string(), TASK_EXTRACTION_PROMPT.to_string());
    map.insert(EVENT_EXTRACTION.to_string(), EVENT_EXTRACTION_PROMPT.to_string());
    map.insert(REPLY_GENERATION.to_string(), REPLY_GENERATION_PROMPT.to_string());
    map.insert(
        NEW_DRAFT_GENERATION.to_string(),
        NEW_DRAFT_GENERATION_PROMPT.to_string(),
    );
    map.insert(EXPLANATION.to_string(), EXPLANATION_PROMPT.to_string());
    map.insert(TONE_CHECK.to_string(), TONE_CHECK_PROMPT.to_string());
    map.insert(SENDER_CONTEXT.to_string(), SENDER_CONTEXT_PROMPT.to_string());
    map.insert(INBOX_QUERY.to_string(), INBOX_QUERY_PROMPT.to_string());
    map
}

/// Default template for a prompt name
pub fn default_prompt(name: &str) -> Option<&'static str> {
    let template = match name {
        CATEGORIZATION => CATEGORIZATION_PROMPT,
        TASK_EXTRACTION => TASK_EXTRACTION_PROMPT,
        EVENT_EXTRACTION => EVENT_EXTRACTION_PROMPT,
        REPLY_GENERATION => REPLY_GENERATION_PROMPT,
        NEW_DRAFT_GENERATION => NEW_DRAFT_GENERATION_PROMPT,
        EXPLANATION => EXPLANATION_PROMPT,
        TONE_CHECK => TONE_CHECK_PROMPT,
        SENDER_CONTEXT => SENDER_CONTEXT_PROMPT,
        INBOX_QUERY => INBOX_QUERY_PROMPT,
        _ => return None,
    };
    Some(template)
}

/// Substitute `{name}` placeholders
///
/// `{{` and `}}` produce literal braces. A placeholder with no value, or an
/// unmatched brace, is an error rather than being passed through to the model.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    output.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed {
                    return Err(AgentError::Template(format!(
                        "Unclosed placeholder '{{{}'",
                        name
                    )));
                }
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name.trim())
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        AgentError::Template(format!("No value for placeholder '{{{}}}'", name))
                    })?;
                output.push_str(value);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    output.push('}');
                } else {
                    return Err(AgentError::Template(
                        "Single '}' encountered in template".to_string(),
                    ));
                }
            }
            _ => output.push(c),
        }
    }

    Ok(output)
}

/// Load prompts from disk, merged over the defaults
///
/// A missing file yields the defaults. An unreadable or malformed file is
/// logged and also yields the defaults.
pub async fn load_prompts(path: &Path) -> PromptMap {
    let mut prompts = default_prompts();

    if !path.exists() {
        tracing::debug!("No prompt file at {:?}, using defaults", path);
        return prompts;
    }

    let saved = match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str::<PromptMap>(&content),
        Err(e) => {
            tracing::warn!("Failed to read prompts from {:?}: {}", path, e);
            return prompts;
        }
    };

    match saved {
        Ok(saved) => {
            tracing::info!("Loaded {} saved prompts from {:?}", saved.len(), path);
            prompts.extend(saved);
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed prompt file {:?}: {}", path, e);
        }
    }

    prompts
}

/// Write the full prompt map to disk
pub async fn save_prompts(path: &Path, prompts: &PromptMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(prompts)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!("Saved {} prompts to {:?}", prompts.len(), path);
    Ok(())
}
