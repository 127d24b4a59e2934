//! Inbox Agent
//!
//! An LLM-assisted inbox assistant. It loads emails from a mock inbox file or
//! a read-only Gmail account, categorizes them, extracts tasks and calendar
//! events, and drafts replies that are stored but never sent.
//!
//! # Overview
//!
//! - **Processing**: per-email categorization, task and event extraction, with
//!   each capability failing independently
//! - **Session state**: one in-memory store for emails, tasks, events,
//!   reminders, drafts and prompt templates
//! - **Drafting**: replies and new emails with follow-up suggestions and an
//!   optional tone check
//! - **Calendar**: confirmed events and dated tasks written to Google Calendar
//!
//! # Example Usage
//!
//! ```no_run
//! use inbox_agent::{config::Config, llm, mock_data::MockInbox, source::MailSource};
//! use inbox_agent::{EmailProcessor, LlmClient, ProcessOptions, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!     let provider = llm::build_provider(&config.llm)?;
//!     let processor = EmailProcessor::new(
//!         LlmClient::new(provider, config.processing.body_char_limit),
//!         inbox_agent::prompts::default_prompts(),
//!     );
//!
//!     let mut state = SessionState::default();
//!     let inbox = MockInbox::new(config.storage.mock_inbox_path());
//!     state.load_emails(inbox.fetch_emails(10).await?);
//!
//!     let mut email = state.emails()[0].clone();
//!     let result = processor.process_email(&mut email, ProcessOptions::default()).await;
//!     state.apply_processing_result(result);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 hubs for Gmail (read-only) and Google Calendar
//! - [`calendar`] - Calendar entries for events and tasks
//! - [`cli`] - Command-line interface and command runners
//! - [`config`] - Configuration management
//! - [`date_utils`] - Lenient parsing of model-produced dates and times
//! - [`drafts`] - Draft composition and persistence
//! - [`error`] - Error types and result aliases
//! - [`gmail`] - Gmail message fetch and conversion
//! - [`llm`] - LLM providers and typed capabilities
//! - [`mock_data`] - Mock inbox and sample emails
//! - [`models`] - Core data structures
//! - [`processor`] - Per-email processing orchestration
//! - [`prompts`] - Prompt templates and rendering
//! - [`review`] - Interactive review of suggested events
//! - [`source`] - Inbox source abstraction
//! - [`state`] - Session state store

pub mod auth;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod date_utils;
pub mod drafts;
pub mod error;
pub mod gmail;
pub mod llm;
pub mod mock_data;
pub mod models;
pub mod processor;
pub mod prompts;
pub mod review;
pub mod source;
pub mod state;

// Re-export commonly used types for convenience
pub use error::{AgentError, Result};

// Core data models
pub use models::{
    Category, CategoryResult, Draft, DraftStatus, Email, Event, EventKind, EventStatus, Priority,
    Reminder, ReminderPreset, ReminderStatus, Task, TaskStatus, Tone, ToneReview,
};

// Config types
pub use config::{CalendarConfig, Config, GmailConfig, LlmConfig, ProcessingConfig, StorageConfig};

// LLM seam and processing
pub use llm::{LlmClient, LlmProvider, OllamaProvider, OpenAiProvider};
pub use processor::{Capability, EmailProcessor, ProcessOptions, ProcessingResult};

// Store
pub use state::{InboxContext, InboxMode, SessionState};

// Sources and sinks
pub use calendar::{CalendarSink, GoogleCalendarClient};
pub use gmail::GmailSource;
pub use mock_data::MockInbox;
pub use source::MailSource;

// CLI types (for binary usage)
pub use cli::{Cli, Commands, ProgressReporter, Workspace};
