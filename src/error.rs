use thiserror::Error;

/// Type alias for Result with AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error types for the inbox agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM backend unreachable or returned an error status
    #[error("LLM error: {0}")]
    Llm(String),

    /// Model output could not be converted into the expected record shape
    #[error("Failed to parse model response: {0}")]
    Parse(String),

    /// Prompt template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    Api(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Resource not found (unknown id, 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Calendar API errors
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AgentError {
    /// Errors raised by the LLM boundary: the provider call or the parse of its output
    pub fn is_llm_failure(&self) -> bool {
        matches!(
            self,
            AgentError::Llm(_)
                | AgentError::Parse(_)
                | AgentError::Template(_)
                | AgentError::Network(_)
        )
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AgentError::Network(format!("Request timed out: {}", error))
        } else if error.is_decode() {
            AgentError::Parse(error.to_string())
        } else {
            AgentError::Network(error.to_string())
        }
    }
}

impl From<google_gmail1::Error> for AgentError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let message = format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status.as_u16() {
                    404 => AgentError::NotFound("Gmail resource not found".to_string()),
                    401 | 403 => AgentError::Auth(message),
                    _ => AgentError::Api(message),
                }
            }
            google_gmail1::Error::HttpError(ref err) => {
                AgentError::Network(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => AgentError::Network(err.to_string()),
            _ => AgentError::Api(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_failures() {
        assert!(AgentError::Llm("connection refused".to_string()).is_llm_failure());
        assert!(AgentError::Parse("expected array".to_string()).is_llm_failure());
        assert!(AgentError::Template("unknown placeholder".to_string()).is_llm_failure());
        assert!(!AgentError::Config("bad mode".to_string()).is_llm_failure());
        assert!(!AgentError::NotFound("mock_1".to_string()).is_llm_failure());
    }

    #[test]
    fn test_error_display() {
        let error = AgentError::Parse("expected value at line 1".to_string());
        let display = format!("{}", error);
        assert!(display.contains("Failed to parse model response"));
        assert!(display.contains("line 1"));

        let auth_error = AgentError::Auth("Invalid token".to_string());
        assert!(format!("{}", auth_error).contains("Authentication failed"));
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let agent_error: AgentError = err.into();
        assert!(matches!(agent_error, AgentError::Serialization(_)));
    }
}
