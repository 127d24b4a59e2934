use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name for the Ollama provider
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            ollama_base_url: default_ollama_base_url(),
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            openai_api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_max_emails_to_fetch")]
    pub max_emails_to_fetch: usize,
    #[serde(default = "default_fetch_count")]
    pub fetch_count: usize,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            token_file: default_token_file(),
            max_emails_to_fetch: default_max_emails_to_fetch(),
            fetch_count: default_fetch_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_calendar_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            credentials_file: default_credentials_file(),
            token_file: default_calendar_token_file(),
            calendar_id: default_calendar_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn mock_inbox_path(&self) -> PathBuf {
        self.data_dir.join("mock_inbox.json")
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.data_dir.join("prompts.json")
    }

    pub fn drafts_path(&self) -> PathBuf {
        self.data_dir.join("drafts.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_mode")]
    pub default_mode: String,
    /// Emails processed automatically after an inbox load
    #[serde(default = "default_auto_process_limit")]
    pub auto_process_limit: usize,
    #[serde(default = "default_body_char_limit")]
    pub body_char_limit: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            auto_process_limit: default_auto_process_limit(),
            body_char_limit: default_body_char_limit(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama2:latest".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_calendar_token_file() -> PathBuf {
    PathBuf::from("calendar_token.json")
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_max_emails_to_fetch() -> usize {
    100
}

fn default_fetch_count() -> usize {
    50
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_mode() -> String {
    "mock".to_string()
}

fn default_auto_process_limit() -> usize {
    10
}

fn default_body_char_limit() -> usize {
    2000
}

impl Config {
    /// Load from a TOML file, then apply environment overrides and validate
    pub async fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| AgentError::Config(format!("Failed to read config file: {}", e)))?;

            let config: Self = toml::from_str(&content)
                .map_err(|e| AgentError::Config(format!("Failed to parse config file: {}", e)))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AgentError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AgentError::Config(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| AgentError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Environment variables win over the file
    pub fn apply_env_overrides(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("LLM_PROVIDER") {
            self.llm.provider = provider.to_lowercase();
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = var("OLLAMA_BASE_URL") {
            self.llm.ollama_base_url = url;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.llm.openai_model = model;
        }
        if let Some(file) = var("GMAIL_CREDENTIALS_FILE") {
            self.gmail.credentials_file = PathBuf::from(file);
        }
        if let Some(file) = var("GMAIL_TOKEN_FILE") {
            self.gmail.token_file = PathBuf::from(file);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.llm.provider.as_str() {
            "ollama" => {}
            "openai" => {
                let has_key = self
                    .llm
                    .openai_api_key
                    .as_deref()
                    .is_some_and(|k| !k.trim().is_empty());
                if !has_key {
                    return Err(AgentError::Config(
                        "llm.openai_api_key is required when llm.provider is 'openai'".to_string(),
                    ));
                }
            }
            other => {
                return Err(AgentError::Config(format!(
                    "Invalid llm.provider: '{}'. Must be 'ollama' or 'openai'",
                    other
                )));
            }
        }

        if self.llm.timeout_secs == 0 {
            return Err(AgentError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.gmail.max_emails_to_fetch == 0 {
            return Err(AgentError::Config(
                "gmail.max_emails_to_fetch must be at least 1".to_string(),
            ));
        }
        if self.gmail.fetch_count == 0 {
            return Err(AgentError::Config(
                "gmail.fetch_count must be at least 1".to_string(),
            ));
        }
        if self.gmail.fetch_count > self.gmail.max_emails_to_fetch {
            return Err(AgentError::Config(format!(
                "gmail.fetch_count ({}) cannot exceed gmail.max_emails_to_fetch ({})",
                self.gmail.fetch_count, self.gmail.max_emails_to_fetch
            )));
        }

        if self.calendar.calendar_id.is_empty() {
            return Err(AgentError::Config(
                "calendar.calendar_id cannot be empty".to_string(),
            ));
        }

        match self.processing.default_mode.as_str() {
            "mock" | "gmail" => {}
            other => {
                return Err(AgentError::Config(format!(
                    "Invalid processing.default_mode: '{}'. Must be 'mock' or 'gmail'",
                    other
                )));
            }
        }

        if self.processing.body_char_limit == 0 {
            return Err(AgentError::Config(
                "processing.body_char_limit must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    const ENV_VARS: [&str; 7] = [
        "LLM_PROVIDER",
        "LLM_MODEL",
        "OLLAMA_BASE_URL",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "GMAIL_CREDENTIALS_FILE",
        "GMAIL_TOKEN_FILE",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama2:latest");
        assert_eq!(config.llm.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.llm.openai_model, "gpt-4-turbo-preview");
        assert!(config.llm.openai_api_key.is_none());
        assert_eq!(config.llm.timeout_secs, 120);

        assert_eq!(config.gmail.max_emails_to_fetch, 100);
        assert_eq!(config.gmail.fetch_count, 50);
        assert!(!config.calendar.enabled);
        assert_eq!(config.calendar.calendar_id, "primary");

        assert_eq!(config.processing.default_mode, "mock");
        assert_eq!(config.processing.auto_process_limit, 10);
        assert_eq!(config.processing.body_char_limit, 2000);
        assert_eq!(
            config.storage.prompts_path(),
            PathBuf::from("data").join("prompts.json")
        );
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.llm.provider = "gemini".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid llm.provider"));
    }

    #[test]
    fn test_config_validation_openai_requires_key() {
        let mut config = Config::default();
        config.llm.provider = "openai".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("openai_api_key is required"));

        config.llm.openai_api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_fetch_count_bounds() {
        let mut config = Config::default();
        config.gmail.fetch_count = 0;
        assert!(config.validate().unwrap_err().to_string().contains("at least 1"));

        config.gmail.fetch_count = 101;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot exceed"));

        config.gmail.fetch_count = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_mode() {
        let mut config = Config::default();
        config.processing.default_mode = "imap".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Invalid processing.default_mode"));

        config.processing.default_mode = "gmail".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_limits() {
        let mut config = Config::default();
        config.processing.body_char_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("LLM_PROVIDER", "OpenAI");
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        std::env::set_var("LLM_MODEL", "mistral");
        std::env::set_var("GMAIL_TOKEN_FILE", "/tmp/tok.json");

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.gmail.token_file, PathBuf::from("/tmp/tok.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_empty_env_values_are_ignored() {
        clear_env();
        std::env::set_var("LLM_MODEL", "  ");

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.llm.model, "llama2:latest");
    }

    #[tokio::test]
    #[serial]
    async fn test_config_load_save_roundtrip() {
        clear_env();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = Config::default();
        config.calendar.enabled = true;
        config.processing.auto_process_limit = 3;
        config.save(path).await.unwrap();

        let loaded = Config::load(path).await.unwrap();
        assert!(loaded.calendar.enabled);
        assert_eq!(loaded.processing.auto_process_limit, 3);
        assert_eq!(loaded.llm.provider, config.llm.provider);
    }

    #[tokio::test]
    #[serial]
    async fn test_config_load_nonexistent_returns_default() {
        clear_env();
        let path = Path::new("/tmp/nonexistent-inbox-agent-config-12345.toml");
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.gmail.max_emails_to_fetch, 100);
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();
        tokio::fs::write(path, "this is not valid toml {[}]")
            .await
            .unwrap();

        let result = Config::load(path).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[tokio::test]
    #[serial]
    async fn test_config_partial_with_defaults() {
        clear_env();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let partial_config = r#"
[llm]
model = "llama3"

[processing]
auto_process_limit = 5
"#;
        tokio::fs::write(path, partial_config).await.unwrap();

        let config = Config::load(path).await.unwrap();
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.processing.auto_process_limit, 5);
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.processing.body_char_limit, 2000);
    }

    #[tokio::test]
    #[serial]
    async fn test_config_create_example() {
        clear_env();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        Config::create_example(&path).await.unwrap();
        assert!(path.exists());

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.processing.default_mode, "mock");
    }
}
