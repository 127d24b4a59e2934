//! Per-email orchestration of the LLM capabilities
//!
//! Each capability is attempted once. A failure is logged and recorded on the
//! result, and the remaining capabilities still run. Nothing here mutates the
//! session store; callers apply the result.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{CategoryResult, Email, Event, Task};
use crate::prompts::{self, PromptMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Categorize,
    ExtractTasks,
    ExtractEvents,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Categorize => "categorize",
            Capability::ExtractTasks => "extract_tasks",
            Capability::ExtractEvents => "extract_events",
        };
        f.write_str(name)
    }
}

/// Which capabilities `process_email` runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub categorize: bool,
    pub extract_tasks: bool,
    pub extract_events: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            categorize: true,
            extract_tasks: true,
            extract_events: true,
        }
    }
}

/// Aggregate outcome for one email
///
/// A capability that was not requested, or that failed, leaves its entry as
/// `None`. Failures are listed in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub email_id: String,
    pub category: Option<CategoryResult>,
    pub tasks: Option<Vec<Task>>,
    pub events: Option<Vec<Event>>,
    pub failures: Vec<(Capability, String)>,
}

impl ProcessingResult {
    pub fn is_complete_failure(&self) -> bool {
        self.category.is_none() && self.tasks.is_none() && self.events.is_none()
    }

    fn record<T>(&mut self, email_id: &str, capability: Capability, outcome: Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("{} failed for email {}: {}", capability, email_id, e);
                self.failures.push((capability, e.to_string()));
                None
            }
        }
    }
}

pub struct EmailProcessor {
    llm: LlmClient,
    prompts: PromptMap,
}

impl EmailProcessor {
    pub fn new(llm: LlmClient, prompts: PromptMap) -> Self {
        Self { llm, prompts }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    pub fn set_prompts(&mut self, prompts: PromptMap) {
        self.prompts = prompts;
    }

    /// Template for `name`: the configured one, else the built-in default
    fn template<'a>(&'a self, name: &str, custom: Option<&'a str>) -> &'a str {
        custom
            .or_else(|| self.prompts.get(name).map(String::as_str))
            .or_else(|| prompts::default_prompt(name))
            .unwrap_or_default()
    }

    pub async fn categorize_email(
        &self,
        email: &Email,
        prompt: Option<&str>,
    ) -> Result<CategoryResult> {
        let template = self.template(prompts::CATEGORIZATION, prompt);
        self.llm.categorize_email(email, template).await
    }

    pub async fn extract_tasks(&self, email: &Email, prompt: Option<&str>) -> Result<Vec<Task>> {
        let template = self.template(prompts::TASK_EXTRACTION, prompt);
        self.llm.extract_tasks(email, template).await
    }

    pub async fn extract_events(&self, email: &Email, prompt: Option<&str>) -> Result<Vec<Event>> {
        let template = self.template(prompts::EVENT_EXTRACTION, prompt);
        self.llm.extract_events(email, template).await
    }

    /// Run the requested capabilities against one email
    ///
    /// A successful categorization is applied to `email` (overwriting any
    /// earlier category). Tasks and events are returned, not stored.
    pub async fn process_email(&self, email: &mut Email, options: ProcessOptions) -> ProcessingResult {
        let email_id = email.id.clone();
        let mut result = ProcessingResult {
            email_id: email_id.clone(),
            ..Default::default()
        };

        if options.categorize {
            let outcome = self.categorize_email(email, None).await;
            if let Some(category) = result.record(&email_id, Capability::Categorize, outcome) {
                email.apply_category(&category);
                result.category = Some(category);
            }
        }

        if options.extract_tasks {
            let outcome = self.extract_tasks(email, None).await;
            result.tasks = result.record(&email_id, Capability::ExtractTasks, outcome);
        }

        if options.extract_events {
            let outcome = self.extract_events(email, None).await;
            result.events = result.record(&email_id, Capability::ExtractEvents, outcome);
        }

        tracing::debug!(
            "Processed email {}: category={}, tasks={}, events={}, failures={}",
            email_id,
            result.category.is_some(),
            result.tasks.as_ref().map_or(0, Vec::len),
            result.events.as_ref().map_or(0, Vec::len),
            result.failures.len()
        );

        result
    }

    /// Process each email in turn, keyed by email id
    pub async fn batch_process_emails(
        &self,
        emails: &mut [Email],
        options: ProcessOptions,
    ) -> HashMap<String, ProcessingResult> {
        let mut results = HashMap::with_capacity(emails.len());

        for email in emails.iter_mut() {
            let result = self.process_email(email, options).await;
            if result.is_complete_failure() && !result.failures.is_empty() {
                tracing::warn!("Every capability failed for email {}", email.id);
            }
            results.insert(email.id.clone(), result);
        }

        tracing::info!("Batch processed {} emails", results.len());
        results
    }
}
