//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::pipeline::Stage;
use crate::store::{validate_identifier, RESERVED_COLUMNS};

// ---------------------------------------------------------------------------
// PredictionConfig
// ---------------------------------------------------------------------------

/// Connection details for the hosted prediction API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Prediction server host name, without scheme (e.g. `"example.orm.datarobot.com"`).
    pub host: String,
    /// Bearer token sent in the `Authorization` header.
    pub api_key: String,
    /// Secondary key sent in the `DataRobot-Key` header.
    pub datarobot_key: String,
    /// Maximum seconds to wait for one prediction before timing out.
    pub timeout_secs: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            datarobot_key: String::new(),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Ordered list of prediction stages run for every submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stages: Vec<Stage>,
}

impl Default for PipelineConfig {
    /// Summarize, then translate the summary.
    fn default() -> Self {
        Self {
            stages: vec![Stage::summarize(""), Stage::translate("")],
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Record store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file path.  `None` means `records.sqlite` in the data dir.
    pub database_path: Option<PathBuf>,
    /// Table receiving one row per submission.
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            table: "SUMMARY_RECORDS".into(),
        }
    }
}

impl StoreConfig {
    /// Configured database path, or the platform default.
    pub fn resolved_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| AppPaths::new().database_file)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// File name used when saving the CSV download.
    pub download_file_name: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (640.0, 560.0),
            download_file_name: "result.csv".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use summary_feedback::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prediction API credentials and host.
    pub prediction: PredictionConfig,
    /// Stages run for each submission.
    pub pipeline: PipelineConfig,
    /// Record store settings.
    pub store: StoreConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the workflow cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.prediction;
        if p.host.trim().is_empty() {
            bail!("prediction.host is not set");
        }
        if p.api_key.is_empty() || p.datarobot_key.is_empty() {
            bail!("prediction.api_key and prediction.datarobot_key must both be set");
        }

        validate_identifier(&self.store.table)?;

        if self.pipeline.stages.is_empty() {
            bail!("pipeline.stages must contain at least one stage");
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for stage in &self.pipeline.stages {
            if stage.deployment_id.trim().is_empty() {
                bail!("stage `{}` has no deployment_id", stage.name);
            }
            validate_identifier(&stage.column)?;

            let column = stage.column.to_ascii_uppercase();
            if RESERVED_COLUMNS.contains(&column.as_str()) {
                bail!("stage `{}` uses reserved column {}", stage.name, stage.column);
            }
            if !columns.insert(column) {
                bail!("column {} is used by more than one stage", stage.column);
            }
            if !names.insert(stage.name.as_str()) {
                bail!("stage name `{}` is used more than once", stage.name);
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
