//! Draft composition and the drafts file
//!
//! Drafts are only ever stored. There is no code path that transmits one.

use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{Draft, DraftStatus, Email, Tone};

/// Generate a reply to `email` with follow-up suggestions
///
/// The follow-up call is best effort: its failure leaves the list empty.
pub async fn compose_reply(
    llm: &LlmClient,
    template: &str,
    email: &Email,
    tone: Tone,
    instructions: Option<&str>,
) -> Result<Draft> {
    let body = llm.generate_reply(email, template, tone, instructions).await?;
    let subject = reply_subject(&email.subject);
    let suggested_followups = followups_or_empty(llm, &subject, &body).await;

    let mut metadata = HashMap::new();
    metadata.insert("type".to_string(), json!("reply"));
    if let Some(category) = email.category {
        metadata.insert("category".to_string(), json!(category.as_str()));
    }
    if let Some(priority) = email.priority {
        metadata.insert("priority".to_string(), json!(priority.as_str()));
    }

    Ok(Draft {
        id: uuid::Uuid::new_v4().to_string(),
        subject,
        body,
        recipient: Some(email.sender.clone()),
        reply_to_email_id: Some(email.id.clone()),
        tone,
        created_at: Utc::now(),
        metadata,
        suggested_followups,
        status: DraftStatus::Draft,
    })
}

/// Generate a new email from free-form requirements
pub async fn compose_new(
    llm: &LlmClient,
    template: &str,
    recipient: &str,
    subject: &str,
    requirements: &str,
    tone: Tone,
) -> Result<Draft> {
    let body = llm
        .compose_email(template, recipient, subject, requirements, tone)
        .await?;
    let suggested_followups = followups_or_empty(llm, subject, &body).await;

    let mut metadata = HashMap::new();
    metadata.insert("type".to_string(), json!("new"));

    Ok(Draft {
        id: uuid::Uuid::new_v4().to_string(),
        subject: subject.to_string(),
        body,
        recipient: Some(recipient.to_string()).filter(|r| !r.trim().is_empty()),
        reply_to_email_id: None,
        tone,
        created_at: Utc::now(),
        metadata,
        suggested_followups,
        status: DraftStatus::Draft,
    })
}

async fn followups_or_empty(llm: &LlmClient, subject: &str, body: &str) -> Vec<String> {
    match llm.suggest_followups(subject, body).await {
        Ok(followups) => followups,
        Err(e) => {
            tracing::warn!("Follow-up suggestions unavailable: {}", e);
            Vec::new()
        }
    }
}

pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
        trimmed.to_string()
    } else {
        format!("Re: {}", trimmed)
    }
}

/// Load saved drafts; a missing or malformed file yields an empty list
pub async fn load_drafts(path: &Path) -> Vec<Draft> {
    if !path.exists() {
        return Vec::new();
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read drafts from {:?}: {}", path, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Draft>>(&content) {
        Ok(drafts) => {
            tracing::debug!("Loaded {} drafts from {:?}", drafts.len(), path);
            drafts
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed drafts file {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Rewrite the drafts file in full
pub async fn save_drafts(path: &Path, drafts: &[Draft]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(drafts)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!("Saved {} drafts to {:?}", drafts.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::llm::LlmProvider;
    use crate::models::{Category, Priority};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Replies with draft text, and with a follow-up list when asked for one
    struct DraftingProvider {
        followups: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for DraftingProvider {
        async fn generate_text(&self, prompt: &str, _temperature: f32) -> Result<String> {
            if prompt.starts_with("Suggest 2-3 follow-up") {
                return self
                    .followups
                    .map(str::to_string)
                    .ok_or_else(|| AgentError::Llm("offline".to_string()));
            }
            Ok("  Thanks, I will be there.  ".to_string())
        }

        fn name(&self) -> &'static str {
            "drafting"
        }
    }

    fn client(followups: Option<&'static str>) -> LlmClient {
        LlmClient::new(Arc::new(DraftingProvider { followups }), 2000)
    }

    fn email() -> Email {
        Email {
            id: "mock_1".to_string(),
            sender: "team.lead@company.com".to_string(),
            sender_name: "John".to_string(),
            subject: "Team Meeting".to_string(),
            body: "Can you attend?".to_string(),
            timestamp: Utc::now(),
            labels: vec![],
            has_attachments: false,
            attachments: vec![],
            category: Some(Category::Meeting),
            priority: Some(Priority::High),
            is_read: false,
            thread_id: None,
        }
    }

    #[test]
    fn test_reply_subject() {
        assert_eq!(reply_subject("Team Meeting"), "Re: Team Meeting");
        assert_eq!(reply_subject("RE: Team Meeting"), "RE: Team Meeting");
        assert_eq!(reply_subject(""), "Re: ");
    }

    #[tokio::test]
    async fn test_compose_reply_builds_draft() {
        let llm = client(Some(r#"["Add to calendar", {"text": "Prepare notes"}]"#));
        let draft = compose_reply(&llm, "{body}", &email(), Tone::Friendly, None)
            .await
            .unwrap();

        assert!(draft.is_reply());
        assert_eq!(draft.reply_to_email_id.as_deref(), Some("mock_1"));
        assert_eq!(draft.recipient.as_deref(), Some("team.lead@company.com"));
        assert_eq!(draft.subject, "Re: Team Meeting");
        assert_eq!(draft.body, "Thanks, I will be there.");
        assert_eq!(draft.status, DraftStatus::Draft);
        assert_eq!(draft.metadata["type"], "reply");
        assert_eq!(draft.metadata["category"], "Meeting");
        assert_eq!(draft.suggested_followups, vec!["Add to calendar", "Prepare notes"]);
    }

    #[tokio::test]
    async fn test_followup_failure_keeps_draft() {
        let llm = client(None);
        let draft = compose_new(
            &llm,
            "{user_requirements} {recipient} {tone} {subject}",
            "",
            "Quarterly update",
            "Summarize Q1",
            Tone::Formal,
        )
        .await
        .unwrap();

        assert!(!draft.is_reply());
        assert!(draft.recipient.is_none());
        assert!(draft.suggested_followups.is_empty());
        assert_eq!(draft.metadata["type"], "new");
    }

    #[tokio::test]
    async fn test_save_and_load_drafts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("drafts.json");

        let llm = client(Some("[]"));
        let draft = compose_reply(&llm, "{body}", &email(), Tone::Concise, Some("accept"))
            .await
            .unwrap();

        save_drafts(&path, std::slice::from_ref(&draft)).await.unwrap();
        let loaded = load_drafts(&path).await;
        assert_eq!(loaded, vec![draft]);
    }

    #[tokio::test]
    async fn test_load_drafts_missing_or_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drafts.json");
        assert!(load_drafts(&path).await.is_empty());

        tokio::fs::write(&path, "{").await.unwrap();
        assert!(load_drafts(&path).await.is_empty());
    }
}
