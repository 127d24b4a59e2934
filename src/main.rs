use anyhow::Result;
use clap::Parser;
use inbox_agent::auth::{self, GMAIL_SCOPES};
use inbox_agent::cli::{self, Cli, Commands, ProgressReporter, Workspace};
use inbox_agent::config::Config;
use inbox_agent::error::AgentError;
use indicatif::MultiProgress;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress to avoid progress bar conflicts
#[derive(Clone)]
struct MultiProgressWriter {
    multi: Arc<MultiProgress>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self.buffer();
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                let _ = self.multi.println(msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// MakeWriter implementation for tracing
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: Arc<MultiProgress>,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(Arc::clone(&self.multi))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display_error(&e);
        eprintln!("\nFor help, run: inbox-agent --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in rustls; pick one crypto provider up front.
    // ring on Windows avoids the NASM/CMake requirement of aws-lc-rs.
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("inbox_agent=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("inbox_agent=info,warn"))
    };

    let multi_progress = Arc::new(MultiProgress::new());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(MultiProgressMakeWriter {
            multi: Arc::clone(&multi_progress),
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let reporter = ProgressReporter::with_multi_progress((*multi_progress).clone());

    match cli.command {
        Commands::Auth { force } => {
            let config = Config::load(&cli.config).await?;

            let mut token_files = vec![config.gmail.token_file.clone()];
            if config.calendar.enabled {
                token_files.push(config.calendar.token_file.clone());
            }
            for token_file in &token_files {
                if let Some(parent) = token_file.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                if force && token_file.exists() {
                    tokio::fs::remove_file(token_file).await?;
                    tracing::info!("Removed cached token {:?}", token_file);
                }
            }

            let hub =
                auth::initialize_gmail_hub(&config.gmail.credentials_file, &config.gmail.token_file)
                    .await?;
            println!("Authenticated with Gmail (read-only)");
            println!("Token cached at: {:?}", config.gmail.token_file);

            // Scope must match the cached token or a second browser flow starts
            let (_, profile) = hub
                .users()
                .get_profile("me")
                .add_scope(GMAIL_SCOPES[0])
                .doit()
                .await
                .map_err(AgentError::from)?;
            println!(
                "Connected to account: {}",
                profile.email_address.unwrap_or_default()
            );

            if config.calendar.enabled {
                auth::initialize_calendar_hub(
                    &config.calendar.credentials_file,
                    &config.calendar.token_file,
                )
                .await?;
                println!("Authenticated with Google Calendar");
                println!("Token cached at: {:?}", config.calendar.token_file);
            }
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(AgentError::Config(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(&output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nKey settings to review:");
            println!("  - llm.provider: 'ollama' (local) or 'openai'");
            println!("  - llm.model / llm.openai_model: model names");
            println!("  - processing.default_mode: 'mock' or 'gmail'");
            println!("  - calendar.enabled: allow review-events --sync-calendar");
            Ok(())
        }

        command => {
            let mut ws = Workspace::open(&cli.config, reporter).await?;
            dispatch(&mut ws, command).await?;
            Ok(())
        }
    }
}

async fn dispatch(ws: &mut Workspace, command: Commands) -> inbox_agent::Result<()> {
    match command {
        Commands::Process { mode, limit } => cli::run_process(ws, mode, limit).await,
        Commands::Ask { query, mode, email } => {
            cli::run_ask(ws, &query, mode, email.as_deref()).await
        }
        Commands::Reply {
            email_id,
            tone,
            instructions,
            check_tone,
        } => cli::run_reply(ws, &email_id, tone, instructions.as_deref(), check_tone).await,
        Commands::Compose {
            to,
            subject,
            requirements,
            tone,
        } => cli::run_compose(ws, &to, &subject, &requirements, tone).await,
        Commands::Explain { email_id } => cli::run_explain(ws, &email_id).await,
        Commands::Sender { email_id } => cli::run_sender(ws, &email_id).await,
        Commands::Remind {
            email_id,
            when,
            note,
        } => cli::run_remind(ws, &email_id, when, note.as_deref()).await,
        Commands::ReviewEvents {
            mode,
            sync_calendar,
            with_tasks,
        } => cli::run_review_events(ws, mode, sync_calendar, with_tasks).await,
        Commands::Prompts { action } => cli::run_prompts(ws, action).await,
        Commands::Drafts { action } => cli::run_drafts(ws, action).await,
        Commands::Auth { .. } | Commands::InitConfig { .. } => Ok(()),
    }
}

/// Display error with context
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {}", cause);
    }

    if let Some(agent_err) = error.downcast_ref::<AgentError>() {
        match agent_err {
            AgentError::Auth(_) => {
                eprintln!("\nHint: Make sure your credentials.json file is valid.");
                eprintln!("      You can download it from Google Cloud Console.");
                eprintln!("      Try running: inbox-agent auth --force");
            }
            AgentError::Api(_) => {
                eprintln!("\nHint: This may be a temporary API error.");
                eprintln!("      Try running the command again.");
            }
            AgentError::Config(_) => {
                eprintln!("\nHint: Check your configuration file for errors.");
                eprintln!("      Run: inbox-agent init-config --force");
            }
            AgentError::NotFound(_) => {
                eprintln!("\nHint: Email ids are listed on the dashboard (inbox-agent process).");
            }
            err if err.is_llm_failure() => {
                eprintln!("\nHint: Check that the LLM backend is running (llm.provider in config).");
            }
            _ => {}
        }
    }
}
