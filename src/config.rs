use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client-side dispatch deadline. Must stay the largest bound in the
/// chain: every hop below it (transport, relay) times out first so
/// failures remain attributable to the hop that caused them.
pub const DEFAULT_DEADLINE_MS: u64 = 130_000;

/// Per-request timeout of the HTTP transport hop, strictly below the
/// dispatch deadline.
pub const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 120_000;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Endpoint
    pub api_url: String,
    pub api_key: String,

    // Model
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    // Timeouts
    pub deadline_ms: u64,
    pub transport_timeout_ms: u64,

    // Reply language directive appended as a trailing system message
    pub reply_language: String,

    // Prompt overrides (empty = use built-in templates)
    #[serde(default)]
    pub generator_prompt: String,
    #[serde(default)]
    pub explainer_prompt: String,

    // Label families recognized by the labeled-line scan
    #[serde(default = "default_keyword_labels")]
    pub keyword_labels: Vec<String>,
    #[serde(default = "default_explanation_labels")]
    pub explanation_labels: Vec<String>,

    // Meta
    pub log_level: String,
    #[serde(default)]
    pub history_enabled: bool,
}

fn default_keyword_labels() -> Vec<String> {
    vec![
        "keyword".to_string(),
        "关键词".to_string(),
        "关键字".to_string(),
    ]
}

fn default_explanation_labels() -> Vec<String> {
    vec![
        "explanation".to_string(),
        "description".to_string(),
        "解释".to_string(),
        "描述".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://openkey.cloud/v1/chat/completions".to_string(),
            api_key: "".to_string(),
            model: "grok-3-mini-beta".to_string(),
            temperature: 0.9,
            max_tokens: 1500,
            deadline_ms: DEFAULT_DEADLINE_MS,
            transport_timeout_ms: DEFAULT_TRANSPORT_TIMEOUT_MS,
            reply_language: "English".to_string(),
            generator_prompt: "".to_string(),
            explainer_prompt: "".to_string(),
            keyword_labels: default_keyword_labels(),
            explanation_labels: default_explanation_labels(),
            log_level: "INFO".to_string(),
            history_enabled: true,
        }
    }
}

impl Config {
    /// Load config from the default location and apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path())?;

        // Environment wins over the file so keys never need to be
        // written to disk
        if let Ok(key) = std::env::var("QUERYSMITH_API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }
        if let Ok(url) = std::env::var("QUERYSMITH_API_URL") {
            if !url.is_empty() {
                config.api_url = url;
            }
        }

        Ok(config)
    }

    /// Load config from a specific file, or create default
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                // Backup corrupt file for debugging
                let backup_path = config_path.with_extension("json.corrupt");
                let _ = std::fs::rename(config_path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("querysmith")
        .join("config.json")
}
