//! Mock inbox: a JSON file of emails, or a built-in sample set when there is none

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Email;
use crate::source::MailSource;
use crate::state::InboxMode;

struct SampleEmail {
    id: &'static str,
    sender: &'static str,
    sender_name: &'static str,
    subject: &'static str,
    body: &'static str,
    age_hours: i64,
    labels: &'static [&'static str],
    attachments: &'static [(&'static str, &'static str)],
    is_read: bool,
}

const PDF: &str = "application/pdf";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const SAMPLES: &[SampleEmail] = &[
    SampleEmail {
        id: "mock_1",
        sender: "professor.smith@university.edu",
        sender_name: "Dr. Sarah Smith",
        subject: "DBMS Mini-Project Deadline Reminder",
        body: "Dear Students,\n\nThis is a reminder that your DBMS mini-project is due on March 15, 2024. Please submit your project report and code repository link by 11:59 PM.\n\nIf you have any questions, please reach out to me or the TA.\n\nBest regards,\nDr. Smith",
        age_hours: 48,
        labels: &["Important", "Work"],
        attachments: &[("project_guidelines.pdf", PDF)],
        is_read: false,
    },
    SampleEmail {
        id: "mock_2",
        sender: "team.lead@company.com",
        sender_name: "John Martinez",
        subject: "Team Meeting Tomorrow at 2 PM",
        body: "Hi team,\n\nWe have a team meeting scheduled for tomorrow (March 10) at 2:00 PM in Conference Room B. Agenda:\n- Q1 Review\n- Project updates\n- Resource allocation\n\nPlease confirm your attendance.\n\nThanks,\nJohn",
        age_hours: 24,
        labels: &["Meeting"],
        attachments: &[],
        is_read: false,
    },
    SampleEmail {
        id: "mock_3",
        sender: "newsletter@techweekly.com",
        sender_name: "Tech Weekly",
        subject: "This Week in Tech: AI Breakthroughs",
        body: "Check out the latest AI developments this week...",
        age_hours: 12,
        labels: &["Newsletter"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_4",
        sender: "mom@family.com",
        sender_name: "Mom",
        subject: "Family Dinner This Weekend",
        body: "Hi sweetie,\n\nDon't forget about family dinner this Saturday at 6 PM. Your dad is making his famous lasagna!\n\nLove,\nMom",
        age_hours: 72,
        labels: &["Personal"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_5",
        sender: "ta.jones@university.edu",
        sender_name: "TA Michael Jones",
        subject: "Assignment 3 Grading Complete",
        body: "Hello,\n\nAssignment 3 has been graded. Grades are available on the course portal. Average score: 85/100.\n\nIf you have questions about your grade, please schedule office hours.\n\nBest,\nMichael",
        age_hours: 120,
        labels: &["Work"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_6",
        sender: "client@business.com",
        sender_name: "Robert Chen",
        subject: "Urgent: Project Proposal Needed",
        body: "Hi,\n\nWe need the project proposal by end of day today. This is urgent. Please send it as soon as possible.\n\nThanks,\nRobert",
        age_hours: 3,
        labels: &["Urgent", "Work"],
        attachments: &[],
        is_read: false,
    },
    SampleEmail {
        id: "mock_7",
        sender: "friend.alex@gmail.com",
        sender_name: "Alex",
        subject: "Weekend Plans?",
        body: "Hey!\n\nWhat are you up to this weekend? Want to grab coffee or see a movie?\n\nLet me know!\nAlex",
        age_hours: 29,
        labels: &["Personal"],
        attachments: &[],
        is_read: false,
    },
    SampleEmail {
        id: "mock_8",
        sender: "hr@company.com",
        sender_name: "HR Department",
        subject: "Performance Review Scheduled",
        body: "Your annual performance review has been scheduled for March 20, 2024 at 10:00 AM. Please prepare a self-assessment document.\n\nLocation: HR Office, Room 301",
        age_hours: 96,
        labels: &["Work", "Important"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_9",
        sender: "spam@fake-winner.com",
        sender_name: "Prize Winner",
        subject: "You've Won $1,000,000!",
        body: "Congratulations! You've won a million dollars! Click here to claim...",
        age_hours: 144,
        labels: &["Spam"],
        attachments: &[],
        is_read: false,
    },
    SampleEmail {
        id: "mock_10",
        sender: "project.manager@company.com",
        sender_name: "Lisa Wang",
        subject: "Project Milestone: Code Review Due",
        body: "The code review for Sprint 3 is due by Friday, March 12. Please ensure all pull requests are reviewed and merged.\n\nKey areas to focus:\n- Security checks\n- Performance optimization\n- Documentation",
        age_hours: 56,
        labels: &["Work", "To-Do"],
        attachments: &[("review_checklist.docx", DOCX)],
        is_read: false,
    },
    SampleEmail {
        id: "mock_11",
        sender: "conference@techconf.org",
        sender_name: "Tech Conference 2024",
        subject: "Your Conference Registration Confirmed",
        body: "Thank you for registering! Your conference pass is attached. Event dates: April 5-7, 2024.\n\nSee you there!",
        age_hours: 168,
        labels: &["Newsletter", "Event"],
        attachments: &[("conference_pass.pdf", PDF)],
        is_read: true,
    },
    SampleEmail {
        id: "mock_12",
        sender: "colleague@company.com",
        sender_name: "David Kim",
        subject: "Re: Database Schema Discussion",
        body: "Thanks for your input on the schema design. I've updated the document with your suggestions. Can we discuss the indexing strategy in our next sync?\n\nBest,\nDavid",
        age_hours: 6,
        labels: &["Work"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_13",
        sender: "bank@secure-bank.com",
        sender_name: "Secure Bank",
        subject: "Monthly Statement Available",
        body: "Your monthly account statement is now available. Please review your transactions.",
        age_hours: 192,
        labels: &["Personal", "Finance"],
        attachments: &[],
        is_read: true,
    },
    SampleEmail {
        id: "mock_14",
        sender: "mentor@career.com",
        sender_name: "Career Mentor",
        subject: "Follow-up: Career Advice Session",
        body: "Following up on our conversation, here are the resources I mentioned:\n1. Industry report\n2. Networking guide\n3. Interview prep materials\n\nLet's schedule another session next month.",
        age_hours: 74,
        labels: &["Personal"],
        attachments: &[
            ("industry_report.pdf", PDF),
            ("networking_guide.pdf", PDF),
        ],
        is_read: false,
    },
    SampleEmail {
        id: "mock_15",
        sender: "deadline.reminder@university.edu",
        sender_name: "Course System",
        subject: "Assignment 4 Due in 3 Days",
        body: "Reminder: Assignment 4 for CS301 is due on March 13, 2024 at 11:59 PM. Don't forget to submit!",
        age_hours: 1,
        labels: &["Work", "Deadline"],
        attachments: &[],
        is_read: false,
    },
];

/// Built-in sample inbox, timestamps relative to `now`
pub fn sample_emails(now: DateTime<Utc>) -> Vec<Email> {
    SAMPLES
        .iter()
        .map(|sample| {
            let attachments: Vec<HashMap<String, Value>> = sample
                .attachments
                .iter()
                .map(|(name, mime)| {
                    HashMap::from([
                        ("name".to_string(), Value::from(*name)),
                        ("type".to_string(), Value::from(*mime)),
                    ])
                })
                .collect();

            Email {
                id: sample.id.to_string(),
                sender: sample.sender.to_string(),
                sender_name: sample.sender_name.to_string(),
                subject: sample.subject.to_string(),
                body: sample.body.to_string(),
                timestamp: now - Duration::hours(sample.age_hours),
                labels: sample.labels.iter().map(|l| l.to_string()).collect(),
                has_attachments: !attachments.is_empty(),
                attachments,
                category: None,
                priority: None,
                is_read: sample.is_read,
                thread_id: None,
            }
        })
        .collect()
}

/// Convert a JSON array of loosely shaped email objects
///
/// Missing fields get defaults. A missing or unreadable timestamp places the
/// email one day further back per position.
pub fn parse_mock_items(items: &[Value], now: DateTime<Utc>) -> Vec<Email> {
    let mut emails = Vec::with_capacity(items.len());

    for item in items {
        let Some(object) = item.as_object() else {
            tracing::warn!("Skipping mock inbox entry that is not an object");
            continue;
        };
        let index = emails.len();
        let text = |key: &str, default: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        let timestamp = object
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(|| now - Duration::days(index as i64));
        let attachments: Vec<HashMap<String, Value>> = object
            .get("attachments")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let has_attachments = object
            .get("has_attachments")
            .and_then(Value::as_bool)
            .unwrap_or(!attachments.is_empty());
        let labels = object
            .get("labels")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        emails.push(Email {
            id: text("id", &format!("mock_{}", index + 1)),
            sender: text("sender", "unknown@example.com"),
            sender_name: text("sender_name", "Unknown Sender"),
            subject: text("subject", "No Subject"),
            body: text("body", ""),
            timestamp,
            labels,
            has_attachments,
            attachments,
            category: None,
            priority: None,
            is_read: object.get("is_read").and_then(Value::as_bool).unwrap_or(false),
            thread_id: object
                .get("thread_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    emails
}

/// RFC 3339, or a naive ISO timestamp read as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub struct MockInbox {
    path: PathBuf,
}

impl MockInbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the inbox file, falling back to the sample set when it is
    /// missing or unusable
    pub async fn load(&self) -> Vec<Email> {
        let now = Utc::now();

        if !self.path.exists() {
            tracing::info!("No mock inbox at {:?}, using sample emails", self.path);
            return sample_emails(now);
        }

        let parsed = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str::<Vec<Value>>(&content)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(items) => {
                let emails = parse_mock_items(&items, now);
                tracing::info!("Loaded {} mock emails from {:?}", emails.len(), self.path);
                emails
            }
            Err(e) => {
                tracing::warn!(
                    "Error loading mock inbox {:?}: {}. Using sample emails",
                    self.path,
                    e
                );
                sample_emails(now)
            }
        }
    }
}

#[async_trait]
impl MailSource for MockInbox {
    async fn fetch_emails(&self, max_results: usize) -> Result<Vec<Email>> {
        let mut emails = self.load().await;
        emails.truncate(max_results);
        Ok(emails)
    }

    fn mode(&self) -> InboxMode {
        InboxMode::Mock
    }
}
