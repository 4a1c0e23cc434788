//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the prediction
//! API, pipeline stages, record store and window, `AppPaths` for
//! cross-platform directories, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, PipelineConfig, PredictionConfig, StoreConfig, UiConfig};
