use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::gmail::GmailSource;
use crate::mock_data::MockInbox;
use crate::models::Email;
use crate::state::InboxMode;

/// Anything that can hand the session a list of emails
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch_emails(&self, max_results: usize) -> Result<Vec<Email>>;

    fn mode(&self) -> InboxMode;
}

/// Open the source for `mode`; Gmail authenticates on the way
pub async fn open_source(mode: InboxMode, config: &Config) -> Result<Box<dyn MailSource>> {
    match mode {
        InboxMode::Mock => Ok(Box::new(MockInbox::new(config.storage.mock_inbox_path()))),
        InboxMode::Gmail => {
            let source = GmailSource::connect(&config.gmail).await?;
            Ok(Box::new(source))
        }
    }
}
