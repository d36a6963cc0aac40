//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the persisted account collection
pub const ACCOUNTS_FILE_NAME: &str = "youtube_accounts.json";

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub youtube: YoutubeConfig,
    pub import: ImportConfig,
    pub advanced: AdvancedConfig,
}

/// Where the collection lives and how other processes' writes are detected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit collection file; defaults to the data directory
    pub data_file: Option<String>,
    pub watch_enabled: bool,
    pub watch_interval_ms: u64,
}

/// YouTube OAuth client and Data API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub api_base: String,
    pub scopes: Vec<String>,
    pub request_timeout_seconds: u64,
    pub max_recent_videos: usize,
}

/// Import flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Simulated latency before an import commits
    pub commit_delay_ms: u64,
    pub max_csv_bytes: u64,
    pub default_avatar: String,
}

/// Advanced configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            youtube: YoutubeConfig::default(),
            import: ImportConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            watch_enabled: true,
            watch_interval_ms: 500,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:3000/api/youtube/callback".to_string(),
            auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/youtube.readonly".to_string()],
            request_timeout_seconds: 30,
            max_recent_videos: 10,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            commit_delay_ms: 0,
            max_csv_bytes: 5 * 1024 * 1024,
            default_avatar: crate::core::models::DEFAULT_PROFILE_IMAGE.to_string(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file, writing defaults if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Credentials from the environment win over the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(&Self::env_overrides());
    }

    fn env_overrides() -> HashMap<String, String> {
        ["YOUTUBE_CLIENT_ID", "YOUTUBE_CLIENT_SECRET", "YOUTUBE_REDIRECT_URI"]
            .into_iter()
            .filter_map(|key| {
                std::env::var(key)
                    .ok()
                    .filter(|value| !value.is_empty())
                    .map(|value| (key.to_string(), value))
            })
            .collect()
    }

    fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        if let Some(value) = overrides.get("YOUTUBE_CLIENT_ID") {
            self.youtube.client_id = value.clone();
        }
        if let Some(value) = overrides.get("YOUTUBE_CLIENT_SECRET") {
            self.youtube.client_secret = value.clone();
        }
        if let Some(value) = overrides.get("YOUTUBE_REDIRECT_URI") {
            self.youtube.redirect_uri = value.clone();
        }
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "youtubeaccounts", "manager")
            .with_context(|| "Failed to get project directories")?;

        let config_dir = project_dirs.config_dir();
        Ok(config_dir.join("config.json"))
    }

    /// Get the application data directory
    pub fn get_data_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "youtubeaccounts", "manager")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.data_dir().to_path_buf())
    }

    /// Resolve the collection file: the configured override or the data directory
    pub fn accounts_file(&self) -> Result<PathBuf> {
        match self.storage.data_file.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::get_data_dir()?.join(ACCOUNTS_FILE_NAME)),
        }
    }

    /// Reset configuration to defaults
    pub fn reset() -> Result<Self> {
        let config = Self::default();
        config.save()?;
        tracing::info!("Reset configuration to defaults");
        Ok(config)
    }

    /// Export configuration as JSON string
    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to export configuration")
    }

    /// Parse and validate configuration from a JSON string
    pub fn import(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse imported configuration")?;

        config
            .validate()
            .with_context(|| "Imported configuration is invalid")?;

        tracing::info!("Imported and validated configuration from JSON");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.watch_enabled
            && (self.storage.watch_interval_ms < 50 || self.storage.watch_interval_ms > 60_000)
        {
            anyhow::bail!("Watch interval should be between 50 and 60000 milliseconds");
        }

        if self.youtube.request_timeout_seconds == 0 || self.youtube.request_timeout_seconds > 300
        {
            anyhow::bail!("Request timeout should be between 1 and 300 seconds");
        }

        for (name, value) in [
            ("redirect URI", &self.youtube.redirect_uri),
            ("authorization endpoint", &self.youtube.auth_endpoint),
            ("token endpoint", &self.youtube.token_endpoint),
            ("API base", &self.youtube.api_base),
        ] {
            url::Url::parse(value).with_context(|| format!("Invalid YouTube {}: {}", name, value))?;
        }

        if self.youtube.max_recent_videos > 50 {
            anyhow::bail!("Recent videos should not exceed 50 (API page size)");
        }

        if self.import.max_csv_bytes == 0 {
            anyhow::bail!("CSV size limit must be greater than 0");
        }

        if self.import.commit_delay_ms > 10_000 {
            anyhow::bail!("Commit delay should not exceed 10 seconds");
        }

        if !["error", "warn", "info", "debug", "trace"].contains(&self.advanced.log_level.as_str())
        {
            anyhow::bail!(
                "Invalid log level: must be 'error', 'warn', 'info', 'debug', or 'trace'"
            );
        }

        Ok(())
    }
}
