//! Configuration infrastructure
//!
//! Settings are grouped by concern:
//! 1. `site`: where the program lives (live start URL or saved snapshot)
//! 2. `selectors`: the selector catalog for the target site
//! 3. `traversal`: scan range, waits and retry policy
//! 4. `logging` / `output`: process-level concerns
//!
//! A config file is layered with `PROGRAM_CRAWLER__*` environment overrides.

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

pub use crate::infrastructure::parsing::config::SelectorCatalog;

/// Default values shared by config structs and their consumers.
pub mod defaults {
    pub const START_INDEX: usize = 0;
    pub const SCAN_COUNT: usize = 2;
    pub const SETTLE_DURATION_MS: u64 = 5_000;

    pub const CLICK_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 1_000;
    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

    pub const ELEMENT_TIMEOUT_MS: u64 = 10_000;
    pub const PEOPLE_TIMEOUT_MS: u64 = 20_000;
    pub const LIST_TIMEOUT_MS: u64 = 20_000;
    pub const SECTION_TIMEOUT_MS: u64 = 20_000;
    pub const INTERACTABLE_TIMEOUT_MS: u64 = 10_000;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_NAME: &str = "program-crawler.log";
    pub const LOG_MAX_FILES: u32 = 10;

    pub const OUTPUT_PATH: &str = "program_output.csv";
}

/// Target site constants for the default catalog.
pub mod asco {
    pub const SITE_NAME: &str = "asco";
    /// Live scheduled-sessions page; set it as `site.start_url` for a driver
    /// that can reach the network.
    pub const SCHEDULED_SESSIONS_URL: &str =
        "https://meetings.asco.org/meetings/2024-asco-annual-meeting/316/program-guide/scheduled-sessions";
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub selectors: SelectorCatalog,
    pub traversal: TraversalConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Loaded before the walk starts; `None` keeps the accessor's current page.
    pub start_url: Option<String>,
    /// Directory of saved pages for the offline driver.
    pub snapshot_dir: Option<PathBuf>,
    /// File inside `snapshot_dir` holding the session list.
    pub start_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: asco::SITE_NAME.to_string(),
            start_url: None,
            snapshot_dir: None,
            start_page: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    pub start_index: usize,
    pub scan_count: usize,
    pub settle_duration_ms: u64,
    pub click_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub element_timeout_ms: u64,
    pub people_timeout_ms: u64,
    pub list_timeout_ms: u64,
    pub section_timeout_ms: u64,
    pub interactable_timeout_ms: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            start_index: defaults::START_INDEX,
            scan_count: defaults::SCAN_COUNT,
            settle_duration_ms: defaults::SETTLE_DURATION_MS,
            click_max_attempts: defaults::CLICK_MAX_ATTEMPTS,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            element_timeout_ms: defaults::ELEMENT_TIMEOUT_MS,
            people_timeout_ms: defaults::PEOPLE_TIMEOUT_MS,
            list_timeout_ms: defaults::LIST_TIMEOUT_MS,
            section_timeout_ms: defaults::SECTION_TIMEOUT_MS,
            interactable_timeout_ms: defaults::INTERACTABLE_TIMEOUT_MS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Defaults to `logs/` next to the executable.
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
    /// Keep at most this many log files when cleaning up
    pub max_files: u32,
    pub auto_cleanup_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::OUTPUT_PATH),
            format: OutputFormat::Csv,
        }
    }
}

impl AppConfig {
    /// Load a config file (any format the `config` crate understands) with
    /// `PROGRAM_CRAWLER__SECTION__KEY` environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("PROGRAM_CRAWLER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}

/// Per-user configuration file management.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("program-crawler");
        Ok(config_dir)
    }

    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("program_crawler_config.json");
        Ok(Self { config_path })
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, writing the defaults first if none exists yet.
    pub async fn load_or_initialize(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            return self.load_config().await;
        }
        info!(
            "🎉 No configuration at {:?} - writing defaults",
            self.config_path
        );
        let config = AppConfig::default();
        self.save_config(&config).await?;
        Ok(config)
    }

    pub async fn load_config(&self) -> Result<AppConfig> {
        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", self.config_path))?;
        info!("✅ Configuration loaded from {:?}", self.config_path);
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;
        info!("💾 Configuration saved to {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::selector_keys;

    #[test]
    fn defaults_match_site_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.traversal.scan_count, 2);
        assert_eq!(config.traversal.settle_duration_ms, 5_000);
        assert_eq!(config.traversal.click_max_attempts, 3);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert!(config.selectors.contains(selector_keys::SESSION_LIST));
    }

    #[test]
    fn from_file_reads_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawler.json");
        std::fs::write(
            &path,
            r#"{
                "traversal": { "scan_count": 7 },
                "selectors": { "session_list": "li.result", "date_time": "time" },
                "output": { "path": "out.json", "format": "json" }
            }"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.traversal.scan_count, 7);
        assert_eq!(config.traversal.click_max_attempts, 3);
        assert_eq!(config.selectors.get(selector_keys::SESSION_LIST), Some("li.result"));
        assert_eq!(config.selectors.get(selector_keys::TITLE), None);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = AppConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration"));
    }

    #[tokio::test]
    async fn manager_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let first = manager.load_or_initialize().await.unwrap();
        assert!(manager.config_path().exists());

        let second = manager.load_or_initialize().await.unwrap();
        assert_eq!(first.traversal.scan_count, second.traversal.scan_count);
        assert_eq!(first.selectors, second.selectors);
    }
}
