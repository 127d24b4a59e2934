//! OAuth2 hub construction for Gmail (read-only) and Google Calendar

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AgentError, Result};

/// The only Gmail scope this crate ever requests; it cannot send or modify mail
pub const GMAIL_SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.readonly"];

/// Create calendar entries only
pub const CALENDAR_SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar.events"];

pub type GmailHub = google_gmail1::Gmail<
    google_gmail1::hyper_rustls::HttpsConnector<
        google_gmail1::hyper_util::client::legacy::connect::HttpConnector,
    >,
>;

pub type CalendarHub = google_calendar3::CalendarHub<
    google_calendar3::hyper_rustls::HttpsConnector<
        google_calendar3::hyper_util::client::legacy::connect::HttpConnector,
    >,
>;

/// Initialize the Gmail hub, running the browser flow if no token is cached
pub async fn initialize_gmail_hub(credentials_path: &Path, token_cache_path: &Path) -> Result<GmailHub> {
    use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2};

    ensure_credentials_file(credentials_path)?;
    let secret = yup_oauth2::read_application_secret(credentials_path)
        .await
        .map_err(|e| AgentError::Auth(format!("Failed to read credentials: {}", e)))?;

    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| AgentError::Auth(format!("Failed to build authenticator: {}", e)))?;

    // Cache the token with the read-only scope before any API call
    auth.token(GMAIL_SCOPES)
        .await
        .map_err(|e| AgentError::Auth(format!("Failed to obtain token: {}", e)))?;
    secure_token_file(token_cache_path).await?;

    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| AgentError::Auth(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    tracing::info!("Gmail authenticated (read-only)");
    Ok(google_gmail1::Gmail::new(client, auth))
}

/// Initialize the Calendar hub with its own token cache
pub async fn initialize_calendar_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<CalendarHub> {
    use google_calendar3::{hyper_rustls, hyper_util, yup_oauth2};

    ensure_credentials_file(credentials_path)?;
    let secret = yup_oauth2::read_application_secret(credentials_path)
        .await
        .map_err(|e| AgentError::Auth(format!("Failed to read credentials: {}", e)))?;

    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| AgentError::Auth(format!("Failed to build calendar authenticator: {}", e)))?;

    auth.token(CALENDAR_SCOPES)
        .await
        .map_err(|e| AgentError::Auth(format!("Failed to obtain calendar token: {}", e)))?;
    secure_token_file(token_cache_path).await?;

    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| AgentError::Auth(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    tracing::info!("Google Calendar authenticated");
    Ok(google_calendar3::CalendarHub::new(client, auth))
}

fn ensure_credentials_file(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(AgentError::Auth(format!(
            "Credentials file not found at {:?}. Download an OAuth client (Desktop app) JSON from Google Cloud Console",
            path
        )))
    }
}

/// Google's OAuth client JSON for an installed (desktop) app
#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub installed: InstalledApp,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    #[serde(default)]
    pub project_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

pub async fn load_credentials(path: &Path) -> Result<Credentials> {
    let content = tokio::fs::read_to_string(path).await?;
    let creds = serde_json::from_str(&content)?;
    Ok(creds)
}

/// Restrict the token cache to the owner (0600)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if !path.exists() {
        return Ok(());
    }
    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
