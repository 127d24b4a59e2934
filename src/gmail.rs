//! Read-only Gmail inbox fetch
//!
//! Messages are listed, fetched in full one at a time, and converted into
//! [`Email`] records. A message that fails to fetch or convert is skipped.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use google_gmail1::api::{Message, MessagePart};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::{initialize_gmail_hub, GmailHub, GMAIL_SCOPES};
use crate::config::GmailConfig;
use crate::error::{AgentError, Result};
use crate::models::Email;
use crate::source::MailSource;
use crate::state::InboxMode;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

pub struct GmailSource {
    hub: GmailHub,
    max_emails_to_fetch: usize,
    page_size: usize,
}

impl GmailSource {
    pub fn new(hub: GmailHub, config: &GmailConfig) -> Self {
        Self {
            hub,
            max_emails_to_fetch: config.max_emails_to_fetch,
            page_size: config.fetch_count,
        }
    }

    /// Authenticate with the configured credential and token files
    pub async fn connect(config: &GmailConfig) -> Result<Self> {
        let hub = initialize_gmail_hub(&config.credentials_file, &config.token_file).await?;
        Ok(Self::new(hub, config))
    }

    async fn list_message_ids(&self, limit: usize) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < limit {
            let page = self.page_size.min(limit - ids.len()).max(1);
            let mut call = self
                .hub
                .users()
                .messages_list("me")
                .add_label_ids("INBOX")
                .max_results(page as u32);

            if let Some(token) = page_token.as_ref() {
                call = call.page_token(token);
            }

            let (_, response) = call.add_scope(GMAIL_SCOPES[0]).doit().await?;

            ids.extend(
                response
                    .messages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|m| m.id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        ids.truncate(limit);
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<Email> {
        let (_, message) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("full")
            .add_scope(GMAIL_SCOPES[0])
            .doit()
            .await?;
        parse_message(message)
    }
}

#[async_trait]
impl MailSource for GmailSource {
    async fn fetch_emails(&self, max_results: usize) -> Result<Vec<Email>> {
        let limit = max_results.min(self.max_emails_to_fetch);
        let ids = self.list_message_ids(limit).await?;
        tracing::info!("Fetching {} Gmail messages", ids.len());

        let mut emails = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get_message(id).await {
                Ok(email) => emails.push(email),
                Err(e) => tracing::warn!("Skipping Gmail message {}: {}", id, e),
            }
        }

        tracing::info!("Fetched {} of {} Gmail messages", emails.len(), ids.len());
        Ok(emails)
    }

    fn mode(&self) -> InboxMode {
        InboxMode::Gmail
    }
}

/// Convert a full-format Gmail message
pub fn parse_message(msg: Message) -> Result<Email> {
    let id = msg
        .id
        .ok_or_else(|| AgentError::Api("Message has no id".to_string()))?;
    let labels = msg.label_ids.unwrap_or_default();
    let payload = msg
        .payload
        .ok_or_else(|| AgentError::Api(format!("Message {} has no payload", id)))?;

    let mut sender = String::new();
    let mut sender_name = String::new();
    let mut subject = String::new();
    let mut date_header = String::new();

    for header in payload.headers.iter().flatten() {
        if let (Some(name), Some(value)) = (&header.name, &header.value) {
            match name.to_lowercase().as_str() {
                "from" => {
                    let (name_part, address) = parse_from_header(value);
                    sender_name = name_part;
                    sender = address;
                }
                "subject" => subject = value.clone(),
                "date" => date_header = value.clone(),
                _ => {}
            }
        }
    }

    let timestamp = parse_header_date(&date_header)
        .or_else(|| {
            msg.internal_date
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        })
        .unwrap_or_else(Utc::now);

    let body = extract_body(&payload);
    let mut attachments = Vec::new();
    collect_attachments(&payload, &mut attachments);

    Ok(Email {
        id,
        is_read: !labels.iter().any(|l| l == "UNREAD"),
        sender_name: if sender_name.is_empty() {
            sender.clone()
        } else {
            sender_name
        },
        sender,
        subject: if subject.is_empty() {
            "(No Subject)".to_string()
        } else {
            subject
        },
        body,
        timestamp,
        labels,
        has_attachments: !attachments.is_empty(),
        attachments,
        category: None,
        priority: None,
        thread_id: msg.thread_id,
    })
}

/// Split `Name <addr>`; a bare address is its own name
fn parse_from_header(value: &str) -> (String, String) {
    if let (Some(start), Some(end)) = (value.find('<'), value.rfind('>')) {
        if start < end {
            let name = value[..start].trim().trim_matches('"').to_string();
            let address = value[start + 1..end].trim().to_string();
            return (name, address);
        }
    }
    let address = value.trim().to_string();
    (address.clone(), address)
}

fn parse_header_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    // Some servers append "(UTC)" style comments
    let value = value.split(" (").next().unwrap_or(value);
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Plain text if present anywhere in the tree, else tag-stripped HTML
fn extract_body(payload: &MessagePart) -> String {
    if let Some(text) = find_part_text(payload, "text/plain") {
        return text.trim().to_string();
    }
    if let Some(html) = find_part_text(payload, "text/html") {
        return html_to_text(&html);
    }
    String::new()
}

fn find_part_text(part: &MessagePart, mime: &str) -> Option<String> {
    let is_attachment = part.filename.as_deref().is_some_and(|f| !f.is_empty());
    if !is_attachment && part.mime_type.as_deref() == Some(mime) {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) {
            return Some(String::from_utf8_lossy(data).into_owned());
        }
    }
    part.parts
        .iter()
        .flatten()
        .find_map(|child| find_part_text(child, mime))
}

fn html_to_text(html: &str) -> String {
    let stripped = HTML_TAG.replace_all(html, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    BLANK_LINES.replace_all(decoded.trim(), "\n\n").to_string()
}

fn collect_attachments(part: &MessagePart, out: &mut Vec<HashMap<String, Value>>) {
    if let Some(filename) = part.filename.as_deref().filter(|f| !f.is_empty()) {
        let mut attachment = HashMap::new();
        attachment.insert("name".to_string(), Value::from(filename));
        attachment.insert(
            "type".to_string(),
            Value::from(part.mime_type.clone().unwrap_or_default()),
        );
        if let Some(size) = part.body.as_ref().and_then(|b| b.size) {
            attachment.insert("size".to_string(), Value::from(size));
        }
        out.push(attachment);
    }
    for child in part.parts.iter().flatten() {
        collect_attachments(child, out);
    }
}
