//! Interactive review of suggested events
//!
//! Each suggested event is shown once and can be confirmed, ignored or
//! skipped. Confirmed events can then be written to the calendar.

use std::fmt;

use crate::calendar::CalendarSink;
use crate::error::{AgentError, Result};
use crate::models::Event;
use crate::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Confirm,
    Ignore,
    Skip,
    Quit,
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReviewDecision::Confirm => "Confirm",
            ReviewDecision::Ignore => "Ignore",
            ReviewDecision::Skip => "Skip for now",
            ReviewDecision::Quit => "Stop reviewing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub confirmed: Vec<String>,
    pub ignored: Vec<String>,
    pub skipped: usize,
}

/// One-line description used in prompts and listings
pub fn describe_event(event: &Event) -> String {
    let when = match (&event.start_time, &event.end_time) {
        (Some(start), Some(end)) => format!("{} {}-{}", event.date, start, end),
        (Some(start), None) => format!("{} {}", event.date, start),
        _ => format!("{} (all day)", event.date),
    };
    let mut line = format!("[{}] {} on {}", event.kind, event.title, when);
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    line.push_str(&format!(" (confidence {:.0}%)", event.confidence * 100.0));
    line
}

/// Walk the suggested events, applying each decision to the store
pub fn review_suggested_events<F>(state: &mut SessionState, mut decide: F) -> Result<ReviewSummary>
where
    F: FnMut(&Event) -> Result<ReviewDecision>,
{
    let pending: Vec<Event> = state.suggested_events().into_iter().cloned().collect();
    let mut summary = ReviewSummary::default();

    for event in &pending {
        match decide(event)? {
            ReviewDecision::Confirm => {
                state.confirm_event(&event.event_id);
                summary.confirmed.push(event.event_id.clone());
            }
            ReviewDecision::Ignore => {
                state.ignore_event(&event.event_id);
                summary.ignored.push(event.event_id.clone());
            }
            ReviewDecision::Skip => summary.skipped += 1,
            ReviewDecision::Quit => break,
        }
    }

    tracing::info!(
        "Event review: {} confirmed, {} ignored, {} skipped",
        summary.confirmed.len(),
        summary.ignored.len(),
        summary.skipped
    );
    Ok(summary)
}

/// Ask on the terminal
pub fn prompt_decision(event: &Event) -> Result<ReviewDecision> {
    let options = vec![
        ReviewDecision::Confirm,
        ReviewDecision::Ignore,
        ReviewDecision::Skip,
        ReviewDecision::Quit,
    ];

    match inquire::Select::new(&describe_event(event), options).prompt() {
        Ok(decision) => Ok(decision),
        Err(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        ) => Ok(ReviewDecision::Quit),
        Err(e) => Err(AgentError::Unknown(format!("Prompt failed: {}", e))),
    }
}

/// Push confirmed events to the calendar; returns how many were created
///
/// A failed insert is logged and does not stop the rest.
pub async fn sync_confirmed_events(
    state: &SessionState,
    event_ids: &[String],
    sink: &dyn CalendarSink,
) -> usize {
    let mut created = 0;
    for event_id in event_ids {
        let Some(event) = state.get_event(event_id) else {
            continue;
        };
        match sink.add_event(event).await {
            Ok(_) => created += 1,
            Err(e) => tracing::warn!("Could not add '{}' to calendar: {}", event.title, e),
        }
    }
    created
}
