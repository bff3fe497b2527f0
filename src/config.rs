//! Application configuration types
//!
//! Configuration loads from a TOML file (`confab.toml` by default); every
//! field has a default so a missing file means stock settings. Environment
//! variables override the backend endpoint and timeout.

use anyhow::{Context, Result};
use confab_backend::types::{DEFAULT_ENDPOINT, DEFAULT_SESSION_PREFIX, DEFAULT_TIMEOUT_SECS};
use confab_backend::BackendConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend handler settings
    #[serde(default)]
    pub backend: BackendSettings,
    /// Example prompts offered through `/prompts`
    #[serde(default = "default_prompts")]
    pub prompts: Vec<ExamplePrompt>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            prompts: default_prompts(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file; stock settings when the file
    /// does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Write configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Backend client configuration with environment overrides applied
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new()
            .with_endpoint(&self.backend.endpoint)
            .with_timeout(Duration::from_secs(self.backend.timeout_secs))
            .with_session_prefix(&self.backend.session_prefix)
            .with_env_overrides()
    }
}

/// Backend handler settings (TOML `[backend]` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Handler endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prefix for generated session ids
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            session_prefix: default_session_prefix(),
        }
    }
}

/// One canned example prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplePrompt {
    /// Grouping label shown in the prompt list
    pub category: String,
    /// The prompt text inserted into the input
    pub prompt: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_session_prefix() -> String {
    DEFAULT_SESSION_PREFIX.to_string()
}

fn default_prompts() -> Vec<ExamplePrompt> {
    let knowledge_base = [
        "How many casual leaves can be availed in a year?",
        "Can we apply 4 sick leaves in a row?",
        "Help me with the different types of leave available.",
    ];
    let actions = [
        "My employee id is 1001 and I want to apply casual leave next Monday for 2 days.",
        "Help me with my leave balance. My employee id is 1001.",
        "Can you resend the email notification to the approver for my leave id 4711?",
    ];

    knowledge_base
        .iter()
        .map(|p| ExamplePrompt {
            category: "Leave policy knowledge base".to_string(),
            prompt: (*p).to_string(),
        })
        .chain(actions.iter().map(|p| ExamplePrompt {
            category: "Leave actions".to_string(),
            prompt: (*p).to_string(),
        }))
        .collect()
}
