//! Processor behaviour against a mocked LLM provider

mod common;

use std::sync::Arc;

use common::{make_email, MockProvider, CATEGORIZE_MARKER, EVENTS_MARKER, TASKS_MARKER};
use inbox_agent::error::AgentError;
use inbox_agent::llm::LlmClient;
use inbox_agent::mock_data::MockInbox;
use inbox_agent::models::{Category, Priority};
use inbox_agent::processor::{Capability, EmailProcessor, ProcessOptions};
use inbox_agent::prompts::default_prompts;
use inbox_agent::source::MailSource;
use inbox_agent::state::SessionState;
use serde_json::json;
use tempfile::TempDir;

fn processor(mock: MockProvider) -> EmailProcessor {
    EmailProcessor::new(LlmClient::new(Arc::new(mock), 2000), default_prompts())
}

#[tokio::test]
async fn test_tasks_survive_failed_categorization() {
    let mut mock = MockProvider::new();
    mock.expect_name().return_const("mock");
    mock.expect_generate_text()
        .withf(|prompt, _| prompt.contains(CATEGORIZE_MARKER))
        .times(1)
        .returning(|_, _| Err(AgentError::Llm("model offline".to_string())));
    mock.expect_generate_text()
        .withf(|prompt, _| prompt.contains(TASKS_MARKER))
        .times(1)
        .returning(|_, _| {
            Ok(r#"```json
[{"title": "Submit project report", "due_date": "2024-03-15", "notes": "Include repo link"}]
```"#
                .to_string())
        });
    mock.expect_generate_text()
        .withf(|prompt, _| prompt.contains(EVENTS_MARKER))
        .times(0);

    let processor = processor(mock);
    let mut email = make_email("mock_1", "professor@university.edu", "Project deadline");
    let options = ProcessOptions {
        categorize: true,
        extract_tasks: true,
        extract_events: false,
    };

    let result = processor.process_email(&mut email, options).await;

    assert!(result.category.is_none());
    assert!(result.events.is_none());
    let tasks = result.tasks.as_ref().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_id, "task_mock_1_0");
    assert_eq!(tasks[0].source_email_id, "mock_1");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, Capability::Categorize);
    assert!(!email.is_categorized());

    let mut state = SessionState::default();
    state.load_emails(vec![email]);
    state.apply_processing_result(result);
    assert_eq!(state.tasks().len(), 1);
    assert!(state.events().is_empty());
}

#[tokio::test]
async fn test_batch_continues_after_total_failure() {
    let mut mock = MockProvider::new();
    mock.expect_name().return_const("mock");
    mock.expect_generate_text().returning(|prompt, _| {
        if prompt.contains("Subject: broken") {
            return Err(AgentError::Network("connection reset".to_string()));
        }
        if prompt.contains(CATEGORIZE_MARKER) {
            Ok(json!({"category": "Newsletter", "priority": "Low"}).to_string())
        } else {
            Ok("[]".to_string())
        }
    });

    let processor = processor(mock);
    let mut emails = vec![
        make_email("e1", "news@site.com", "weekly digest"),
        make_email("e2", "x@site.com", "broken"),
        make_email("e3", "news@site.com", "another digest"),
    ];

    let results = processor
        .batch_process_emails(&mut emails, ProcessOptions::default())
        .await;

    assert_eq!(results.len(), 3);
    assert!(results["e2"].is_complete_failure());
    assert_eq!(results["e2"].failures.len(), 3);
    assert_eq!(emails[0].category, Some(Category::Newsletter));
    assert_eq!(emails[2].priority, Some(Priority::Low));
    assert!(emails[1].category.is_none());
}

#[tokio::test]
async fn test_malformed_output_is_a_capability_failure() {
    let mut mock = MockProvider::new();
    mock.expect_name().return_const("mock");
    mock.expect_generate_text()
        .returning(|_, _| Ok("Sure! Here are the events you asked for.".to_string()));

    let processor = processor(mock);
    let mut email = make_email("e1", "a@x.com", "Meeting");
    let result = processor
        .process_email(
            &mut email,
            ProcessOptions {
                categorize: false,
                extract_tasks: false,
                extract_events: true,
            },
        )
        .await;

    assert!(result.events.is_none());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, Capability::ExtractEvents);
}

#[tokio::test]
async fn test_only_work_high_email_is_high_priority() {
    let dir = TempDir::new().unwrap();
    let inbox_path = dir.path().join("mock_inbox.json");
    let items = json!([
        {"id": "a", "sender": "boss@company.com", "subject": "A", "body": "Quarterly numbers"},
        {"id": "b", "sender": "friend@mail.com", "subject": "B", "body": "Dinner?"},
        {"id": "c", "sender": "news@site.com", "subject": "C", "body": "Digest"}
    ]);
    tokio::fs::write(&inbox_path, items.to_string()).await.unwrap();

    let mut state = SessionState::default();
    let inbox = MockInbox::new(&inbox_path);
    let loaded = state.load_emails(inbox.fetch_emails(10).await.unwrap());
    assert_eq!(loaded, 3);

    let mut mock = MockProvider::new();
    mock.expect_name().return_const("mock");
    mock.expect_generate_text()
        .times(3)
        .returning(|prompt, _| {
            if prompt.contains("Subject: A\n") {
                Ok(json!({"category": "Work", "priority": "High", "confidence": 0.95}).to_string())
            } else {
                Ok(json!({"category": "Personal", "priority": "Low", "confidence": 0.7}).to_string())
            }
        });
    let processor = processor(mock);

    let only_categorize = ProcessOptions {
        categorize: true,
        extract_tasks: false,
        extract_events: false,
    };
    let ids: Vec<String> = state.emails().iter().map(|e| e.id.clone()).collect();
    for id in &ids {
        let mut email = state.get_email(id).cloned().unwrap();
        let result = processor.process_email(&mut email, only_categorize).await;
        state.apply_processing_result(result);
    }

    for id in &ids {
        state.mark_read(id, false);
    }
    let urgent = state.get_high_priority_emails();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].subject, "A");
    assert_eq!(state.get_emails_by_category(Category::Work).len(), 1);
    assert_eq!(state.get_emails_by_category(Category::Personal).len(), 2);
}

#[tokio::test]
async fn test_reprocessing_overwrites_category_and_keeps_single_tasks() {
    let mut mock = MockProvider::new();
    mock.expect_name().return_const("mock");
    let mut calls = 0;
    mock.expect_generate_text().returning(move |prompt, _| {
        if prompt.contains(CATEGORIZE_MARKER) {
            calls += 1;
            let priority = if calls == 1 { "Low" } else { "High" };
            Ok(json!({"category": "To-Do", "priority": priority}).to_string())
        } else if prompt.contains(TASKS_MARKER) {
            Ok(json!([{"title": "Reply to client", "task_id": "unique_id"}]).to_string())
        } else {
            Ok("[]".to_string())
        }
    });
    let processor = processor(mock);

    let mut state = SessionState::default();
    state.load_emails(vec![make_email("e1", "client@example.com", "Follow up")]);

    for _ in 0..2 {
        let mut email = state.get_email("e1").cloned().unwrap();
        let result = processor
            .process_email(&mut email, ProcessOptions::default())
            .await;
        state.apply_processing_result(result);
    }

    let email = state.get_email("e1").unwrap();
    assert_eq!(email.category, Some(Category::ToDo));
    assert_eq!(email.priority, Some(Priority::High));
    assert_eq!(state.tasks().len(), 1);
    assert_eq!(state.tasks()[0].task_id, "task_e1_0");
}
