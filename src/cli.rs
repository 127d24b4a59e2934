//! Command-line interface and command runners

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::calendar::{CalendarSink, GoogleCalendarClient};
use crate::config::Config;
use crate::drafts::{self, load_drafts, save_drafts};
use crate::error::{AgentError, Result};
use crate::llm::{build_provider, LlmClient, LlmProvider};
use crate::models::{Draft, Email, Reminder, ReminderPreset, Task, TaskStatus, Tone};
use crate::processor::{EmailProcessor, ProcessOptions};
use crate::prompts::{self, load_prompts, save_prompts, PROMPT_NAMES};
use crate::review::{self, describe_event};
use crate::source::{open_source, MailSource};
use crate::state::{InboxMode, SessionState};

const DASHBOARD_DAYS: i64 = 7;
const DASHBOARD_ITEMS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "inbox-agent")]
#[command(version)]
#[command(about = "LLM-assisted inbox triage: categories, tasks, events and reply drafts", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail (read-only) and, if enabled, Google Calendar
    Auth {
        /// Discard cached tokens and run the browser flow again
        #[arg(long)]
        force: bool,
    },

    /// Generate example configuration file
    InitConfig {
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Load the inbox, process it and show the dashboard
    Process {
        /// Inbox source: mock or gmail (default from config)
        #[arg(long)]
        mode: Option<InboxMode>,

        /// Maximum number of emails to process
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Ask a question about the inbox, or about one email with --email
    Ask {
        query: String,

        #[arg(long)]
        mode: Option<InboxMode>,

        /// Ask about this email instead of the whole inbox
        #[arg(long)]
        email: Option<String>,
    },

    /// Draft a reply to an email
    Reply {
        email_id: String,

        #[arg(long, default_value = "professional")]
        tone: Tone,

        /// Extra guidance for the reply
        #[arg(long)]
        instructions: Option<String>,

        /// Review the draft's tone after generating it
        #[arg(long)]
        check_tone: bool,
    },

    /// Draft a new email
    Compose {
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        /// What the email should say
        #[arg(long)]
        requirements: String,

        #[arg(long, default_value = "professional")]
        tone: Tone,
    },

    /// Explain how an email was categorized and what was extracted
    Explain { email_id: String },

    /// Summarize what is known about an email's sender
    Sender { email_id: String },

    /// Set a reminder on an email (kept for this session)
    Remind {
        email_id: String,

        /// today-evening, tomorrow-morning or next-week
        #[arg(long, default_value = "tomorrow-morning")]
        when: ReminderPreset,

        #[arg(long)]
        note: Option<String>,
    },

    /// Confirm or ignore suggested events
    ReviewEvents {
        #[arg(long)]
        mode: Option<InboxMode>,

        /// Add confirmed events to Google Calendar
        #[arg(long)]
        sync_calendar: bool,

        /// Also add open tasks with a due date to Google Calendar
        #[arg(long, requires = "sync_calendar")]
        with_tasks: bool,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: PromptCommand,
    },

    /// Manage saved drafts
    Drafts {
        #[command(subcommand)]
        action: DraftCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PromptCommand {
    /// List template names, marking customized ones
    List,
    /// Print one template
    Show { name: String },
    /// Replace a template with the contents of a file
    Set { name: String, file: PathBuf },
    /// Restore defaults (one template, or all)
    Reset { name: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    List,
    Show { id: String },
    Delete { id: String },
}

/// Truncate a string to max_len characters, adding "..." if truncated
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len.saturating_sub(3)).collect::<String>())
    }
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_multi_progress(MultiProgress::new())
    }

    /// Share the MultiProgress the log writer prints through
    pub fn with_multi_progress(multi: MultiProgress) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        Self {
            multi,
            spinner_style,
        }
    }

    pub fn multi_progress(&self) -> &MultiProgress {
        &self.multi
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        println!("  ✓ {}", msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a command works on: configuration, the session store and the
/// processor, with prompts and drafts loaded from disk
pub struct Workspace {
    pub config: Config,
    pub state: SessionState,
    processor: EmailProcessor,
    reporter: ProgressReporter,
}

impl Workspace {
    /// Load the config file and build the configured LLM provider
    pub async fn open(config_path: &Path, reporter: ProgressReporter) -> Result<Self> {
        let config = Config::load(config_path).await?;
        let provider = build_provider(&config.llm)?;
        Self::new(config, provider, reporter).await
    }

    pub async fn new(
        config: Config,
        provider: Arc<dyn LlmProvider>,
        reporter: ProgressReporter,
    ) -> Result<Self> {
        let default_mode: InboxMode = config.processing.default_mode.parse()?;
        let mut state = SessionState::new(default_mode);
        state.set_prompts(load_prompts(&config.storage.prompts_path()).await);
        state.set_drafts(load_drafts(&config.storage.drafts_path()).await);

        let llm = LlmClient::new(provider, config.processing.body_char_limit);
        let processor = EmailProcessor::new(llm, state.prompts().clone());

        Ok(Self {
            config,
            state,
            processor,
            reporter,
        })
    }

    pub fn llm(&self) -> &LlmClient {
        self.processor.llm()
    }

    /// Template currently configured for `name`
    fn prompt(&self, name: &str) -> String {
        self.state
            .get_prompt(name)
            .or_else(|| prompts::default_prompt(name))
            .unwrap_or_default()
            .to_string()
    }

    /// Fetch emails from the source for `mode` (default mode when `None`)
    pub async fn load_inbox(&mut self, mode: Option<InboxMode>) -> Result<usize> {
        let mode = mode.unwrap_or(self.state.mode());
        let spinner = self
            .reporter
            .add_spinner(&format!("Loading {} inbox...", mode));
        let source = match open_source(mode, &self.config).await {
            Ok(source) => source,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };
        let outcome = self.load_from(source.as_ref()).await;
        match &outcome {
            Ok(added) => self
                .reporter
                .finish_spinner(&spinner, &format!("Loaded {} emails ({} mode)", added, mode)),
            Err(_) => spinner.finish_and_clear(),
        }
        outcome
    }

    /// Load from an already opened source, switching mode when it differs
    pub async fn load_from(&mut self, source: &dyn MailSource) -> Result<usize> {
        if source.mode() != self.state.mode() {
            self.state.switch_mode(source.mode());
        }
        let emails = source
            .fetch_emails(self.config.gmail.max_emails_to_fetch)
            .await?;
        Ok(self.state.load_emails(emails))
    }

    /// Process up to `limit` emails that have no cached result yet
    pub async fn process_pending(&mut self, limit: usize) -> usize {
        let mut batch: Vec<Email> = self
            .state
            .emails()
            .iter()
            .filter(|e| self.state.cached_result(&e.id).is_none())
            .take(limit)
            .cloned()
            .collect();
        if batch.is_empty() {
            return 0;
        }

        let spinner = self.reporter.add_spinner(&format!(
            "Processing {} emails with {}...",
            batch.len(),
            self.processor.llm().provider_name()
        ));
        let results = self
            .processor
            .batch_process_emails(&mut batch, ProcessOptions::default())
            .await;

        let mut failed = 0;
        for email in &batch {
            if let Some(result) = results.get(&email.id) {
                if !result.failures.is_empty() {
                    failed += 1;
                }
                self.state.apply_processing_result(result.clone());
            }
        }
        self.reporter.finish_spinner(
            &spinner,
            &format!("Processed {} emails ({} with failures)", batch.len(), failed),
        );
        batch.len()
    }

    /// Make sure one email is loaded and processed
    pub async fn ensure_processed(&mut self, email_id: &str) -> Result<()> {
        let mut email = self
            .state
            .get_email(email_id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("No email with id '{}'", email_id)))?;

        if self.state.cached_result(email_id).is_none() {
            let result = self
                .processor
                .process_email(&mut email, ProcessOptions::default())
                .await;
            self.state.apply_processing_result(result);
        }
        Ok(())
    }

    fn email(&self, email_id: &str) -> Result<Email> {
        self.state
            .get_email(email_id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("No email with id '{}'", email_id)))
    }

    pub async fn persist_drafts(&self) -> Result<()> {
        save_drafts(&self.config.storage.drafts_path(), self.state.drafts()).await
    }

    pub async fn persist_prompts(&mut self) -> Result<()> {
        self.processor.set_prompts(self.state.prompts().clone());
        save_prompts(&self.config.storage.prompts_path(), self.state.prompts()).await
    }
}

/// Print a degraded result for an LLM failure, or pass other errors through
fn degrade(what: &str, error: AgentError, provider: &str) -> Result<()> {
    if !error.is_llm_failure() {
        return Err(error);
    }
    println!("\nCould not {}: {}", what, error);
    println!("Hint: check that the {} backend is running and reachable.", provider);
    Ok(())
}

/// Inbox overview printed after processing
pub fn render_dashboard(state: &SessionState, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str("\n========================================\n");
    out.push_str(&format!("Inbox Dashboard ({} mode)\n", state.mode()));
    out.push_str("========================================\n");

    let context = state.inbox_context();
    out.push_str(&format!(
        "Emails: {} ({} unread)\n",
        context.total_emails, context.unread_count
    ));
    out.push_str(&format!("Categories: {}\n", context.categories_line()));

    let urgent = state.get_high_priority_emails();
    out.push_str(&format!("\nHigh priority, unread ({}):\n", urgent.len()));
    for email in urgent.iter().take(DASHBOARD_ITEMS) {
        out.push_str(&format!(
            "  [{}] {} (from {})\n",
            email.id,
            truncate_string(&email.subject, 60),
            email.sender_name
        ));
    }

    let due = state.get_tasks_due_soon_from(today, DASHBOARD_DAYS);
    out.push_str(&format!(
        "\nTasks due in the next {} days ({}):\n",
        DASHBOARD_DAYS,
        due.len()
    ));
    for task in due.iter().take(DASHBOARD_ITEMS) {
        let due_date = task.due_date.map(|d| d.to_string()).unwrap_or_default();
        out.push_str(&format!("  {} {} [{}]\n", due_date, task.title, task.status));
    }

    let upcoming = state.get_upcoming_events_from(today, DASHBOARD_DAYS);
    out.push_str(&format!("\nUpcoming events ({}):\n", upcoming.len()));
    for event in upcoming.iter().take(DASHBOARD_ITEMS) {
        out.push_str(&format!("  {}\n", describe_event(event)));
    }

    let suggested = state.suggested_events().len();
    if suggested > 0 {
        out.push_str(&format!(
            "\n{} suggested events awaiting review (run: inbox-agent review-events)\n",
            suggested
        ));
    }
    out.push_str("========================================\n");
    out
}

pub async fn run_process(ws: &mut Workspace, mode: Option<InboxMode>, limit: Option<usize>) -> Result<()> {
    ws.load_inbox(mode).await?;
    let limit = limit.unwrap_or(ws.config.processing.auto_process_limit);
    ws.process_pending(limit).await;
    print!("{}", render_dashboard(&ws.state, Local::now().date_naive()));
    Ok(())
}

pub async fn run_ask(
    ws: &mut Workspace,
    query: &str,
    mode: Option<InboxMode>,
    email_id: Option<&str>,
) -> Result<()> {
    ws.load_inbox(mode).await?;
    let provider = ws.llm().provider_name();

    if let Some(email_id) = email_id {
        let email = ws.email(email_id)?;
        return match ws.llm().ask_about_email(&email, query).await {
            Ok(answer) => {
                println!("\n{}", answer);
                Ok(())
            }
            Err(e) => degrade("answer the question", e, provider),
        };
    }

    ws.process_pending(ws.config.processing.auto_process_limit)
        .await;
    let context = ws.state.inbox_context();
    let template = ws.prompt(prompts::INBOX_QUERY);

    match ws.llm().answer_inbox_query(&template, query, &context).await {
        Ok(answer) => {
            println!("\n{}", answer);
            Ok(())
        }
        Err(e) => {
            degrade("answer the question", e, provider)?;
            println!(
                "\nInbox: {} emails, {} unread. Categories: {}",
                context.total_emails,
                context.unread_count,
                context.categories_line()
            );
            println!("Tasks: {}", context.tasks_summary);
            println!("Events: {}", context.events_summary);
            Ok(())
        }
    }
}

pub async fn run_reply(
    ws: &mut Workspace,
    email_id: &str,
    tone: Tone,
    instructions: Option<&str>,
    check_tone: bool,
) -> Result<()> {
    ws.load_inbox(None).await?;
    let email = ws.email(email_id)?;
    let provider = ws.llm().provider_name();
    let template = ws.prompt(prompts::REPLY_GENERATION);

    let draft = match drafts::compose_reply(ws.llm(), &template, &email, tone, instructions).await {
        Ok(draft) => draft,
        Err(e) => return degrade("generate a reply", e, provider),
    };

    print_draft(&draft);

    if check_tone {
        let template = ws.prompt(prompts::TONE_CHECK);
        match ws
            .llm()
            .check_reply_tone(&email, &template, &draft.body, tone)
            .await
        {
            Ok(review) => {
                println!("\nTone review:");
                println!("  Tone appropriate: {}", yes_no(review.tone_appropriate));
                println!("  Polite: {}", yes_no(review.is_polite));
                println!("  Answers every question: {}", yes_no(review.all_questions_answered));
                if !review.feedback.is_empty() {
                    println!("  Feedback: {}", review.feedback);
                }
                for suggestion in &review.suggestions {
                    println!("  - {}", suggestion);
                }
            }
            Err(e) => degrade("check the tone", e, provider)?,
        }
    }

    ws.state.add_draft(draft);
    ws.persist_drafts().await?;
    println!("\nDraft saved to {:?}", ws.config.storage.drafts_path());
    Ok(())
}

pub async fn run_compose(
    ws: &mut Workspace,
    to: &str,
    subject: &str,
    requirements: &str,
    tone: Tone,
) -> Result<()> {
    let provider = ws.llm().provider_name();
    let template = ws.prompt(prompts::NEW_DRAFT_GENERATION);

    let draft = match drafts::compose_new(ws.llm(), &template, to, subject, requirements, tone).await {
        Ok(draft) => draft,
        Err(e) => return degrade("compose the email", e, provider),
    };

    print_draft(&draft);
    ws.state.add_draft(draft);
    ws.persist_drafts().await?;
    println!("\nDraft saved to {:?}", ws.config.storage.drafts_path());
    Ok(())
}

pub async fn run_explain(ws: &mut Workspace, email_id: &str) -> Result<()> {
    ws.load_inbox(None).await?;
    ws.ensure_processed(email_id).await?;
    let email = ws.email(email_id)?;

    let tasks: Vec<_> = ws.state.tasks_for_email(email_id).into_iter().cloned().collect();
    let events: Vec<_> = ws.state.events_for_email(email_id).into_iter().cloned().collect();

    println!("\n{} (from {})", email.subject, email.sender);
    println!(
        "Category: {}  Priority: {}",
        email.category.map_or("-".to_string(), |c| c.to_string()),
        email.priority.map_or("-".to_string(), |p| p.to_string())
    );
    println!("Tasks: {}", tasks.len());
    for task in &tasks {
        println!("  - {}", task.title);
    }
    println!("Events: {}", events.len());
    for event in &events {
        println!("  - {}", describe_event(event));
    }
    if let Some(result) = ws.state.cached_result(email_id) {
        for (capability, error) in &result.failures {
            println!("  ! {} failed: {}", capability, error);
        }
    }

    let template = ws.prompt(prompts::EXPLANATION);
    let provider = ws.llm().provider_name();
    match ws
        .llm()
        .explain_decision(&email, &template, &tasks, &events)
        .await
    {
        Ok(explanation) => {
            println!("\n{}", explanation);
            Ok(())
        }
        Err(e) => degrade("explain the decision", e, provider),
    }
}

pub async fn run_remind(
    ws: &mut Workspace,
    email_id: &str,
    when: ReminderPreset,
    note: Option<&str>,
) -> Result<()> {
    ws.load_inbox(None).await?;
    let email = ws.email(email_id)?;
    let note = note
        .map(str::to_string)
        .unwrap_or_else(|| format!("Follow up: {}", email.subject));
    let reminder = Reminder::new(email_id, when.resolve(Local::now()), note);

    println!(
        "Reminder set for {} ({}): {}",
        reminder.reminder_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        when,
        reminder.note
    );
    ws.state.add_reminder(reminder);
    tracing::debug!(
        "{} reminders on {}",
        ws.state.reminders_for_email(email_id).len(),
        email_id
    );
    Ok(())
}

pub async fn run_sender(ws: &mut Workspace, email_id: &str) -> Result<()> {
    ws.load_inbox(None).await?;
    let email = ws.email(email_id)?;
    let history: Vec<Email> = ws
        .state
        .sender_history(email_id)
        .into_iter()
        .cloned()
        .collect();

    println!(
        "\n{} <{}>: {} other emails in this inbox",
        email.sender_name,
        email.sender,
        history.len()
    );
    for previous in &history {
        println!(
            "  {} {}",
            previous.timestamp.format("%Y-%m-%d"),
            truncate_string(&previous.subject, 60)
        );
    }

    let template = ws.prompt(prompts::SENDER_CONTEXT);
    let provider = ws.llm().provider_name();
    match ws.llm().sender_context(&email, &template, &history).await {
        Ok(summary) => {
            println!("\n{}", summary);
            Ok(())
        }
        Err(e) => degrade("summarize the sender", e, provider),
    }
}

pub async fn run_review_events(
    ws: &mut Workspace,
    mode: Option<InboxMode>,
    sync_calendar: bool,
    with_tasks: bool,
) -> Result<()> {
    ws.load_inbox(mode).await?;
    ws.process_pending(ws.config.processing.auto_process_limit)
        .await;

    let pending = ws.state.suggested_events().len();
    if pending == 0 {
        println!("\nNo suggested events to review.");
        return Ok(());
    }
    println!("\n{} suggested events to review\n", pending);

    let multi = ws.reporter.multi_progress().clone();
    let summary = multi.suspend(|| review::review_suggested_events(&mut ws.state, review::prompt_decision))?;

    println!(
        "\nConfirmed {}, ignored {}, skipped {}",
        summary.confirmed.len(),
        summary.ignored.len(),
        summary.skipped
    );

    if !sync_calendar {
        return Ok(());
    }
    if !ws.config.calendar.enabled {
        println!("Calendar sync is disabled. Set calendar.enabled = true in the config file.");
        return Ok(());
    }

    let spinner = ws.reporter.add_spinner("Connecting to Google Calendar...");
    let client = match GoogleCalendarClient::connect(&ws.config.calendar).await {
        Ok(client) => client,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    let created = review::sync_confirmed_events(&ws.state, &summary.confirmed, &client).await;
    ws.reporter.finish_spinner(
        &spinner,
        &format!("Added {} of {} events to calendar", created, summary.confirmed.len()),
    );

    if with_tasks {
        let tasks: Vec<Task> = ws
            .state
            .tasks()
            .iter()
            .filter(|t| t.status != TaskStatus::Done && t.due_date.is_some())
            .cloned()
            .collect();
        let mut added = 0;
        for task in &tasks {
            match client.add_task(task).await {
                Ok(Some(_)) => added += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!("Could not add task '{}' to calendar: {}", task.title, e),
            }
        }
        println!("  ✓ Added {} of {} tasks to calendar", added, tasks.len());
    }
    Ok(())
}

pub async fn run_prompts(ws: &mut Workspace, action: PromptCommand) -> Result<()> {
    match action {
        PromptCommand::List => {
            for name in PROMPT_NAMES {
                let customized = ws.state.get_prompt(name) != prompts::default_prompt(name);
                println!("  {}{}", name, if customized { " (customized)" } else { "" });
            }
        }
        PromptCommand::Show { name } => {
            let template = ws
                .state
                .get_prompt(&name)
                .ok_or_else(|| AgentError::NotFound(format!("Unknown prompt '{}'", name)))?;
            println!("{}", template);
        }
        PromptCommand::Set { name, file } => {
            let template = tokio::fs::read_to_string(&file).await?;
            ws.state.set_prompt(&name, &template)?;
            ws.persist_prompts().await?;
            println!("Updated prompt '{}' from {:?}", name, file);
        }
        PromptCommand::Reset { name: Some(name) } => {
            ws.state.reset_prompt(&name)?;
            ws.persist_prompts().await?;
            println!("Reset prompt '{}' to default", name);
        }
        PromptCommand::Reset { name: None } => {
            ws.state.reset_prompts();
            ws.persist_prompts().await?;
            println!("Reset all prompts to defaults");
        }
    }
    Ok(())
}

pub async fn run_drafts(ws: &mut Workspace, action: DraftCommand) -> Result<()> {
    match action {
        DraftCommand::List => {
            if ws.state.drafts().is_empty() {
                println!("No saved drafts.");
            }
            for draft in ws.state.drafts() {
                println!(
                    "  {}  {}  to {}  [{:?}, {}]",
                    draft.id,
                    truncate_string(&draft.subject, 50),
                    draft.recipient.as_deref().unwrap_or("-"),
                    draft.status,
                    draft.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DraftCommand::Show { id } => {
            let draft = ws
                .state
                .get_draft(&id)
                .ok_or_else(|| AgentError::NotFound(format!("No draft with id '{}'", id)))?;
            print_draft(draft);
        }
        DraftCommand::Delete { id } => {
            if !ws.state.delete_draft(&id) {
                return Err(AgentError::NotFound(format!("No draft with id '{}'", id)));
            }
            ws.persist_drafts().await?;
            println!("Deleted draft {}", id);
        }
    }
    Ok(())
}

fn print_draft(draft: &Draft) {
    println!("\n----------------------------------------");
    if let Some(recipient) = &draft.recipient {
        println!("To: {}", recipient);
    }
    println!("Subject: {}", draft.subject);
    println!("Tone: {}", draft.tone);
    println!("----------------------------------------");
    println!("{}", draft.body);
    println!("----------------------------------------");
    if !draft.suggested_followups.is_empty() {
        println!("Suggested follow-ups:");
        for followup in &draft.suggested_followups {
            println!("  - {}", followup);
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
