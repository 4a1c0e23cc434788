//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\summary-feedback\
//!   macOS:   ~/Library/Application Support/summary-feedback/
//!   Linux:   ~/.config/summary-feedback/
//!
//! Data dir (record store):
//!   Windows: %LOCALAPPDATA%\summary-feedback\
//!   macOS:   ~/Library/Application Support/summary-feedback/
//!   Linux:   ~/.local/share/summary-feedback/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to the default SQLite record store.
    pub database_file: PathBuf,
    /// Where CSV downloads are written.
    pub download_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "summary-feedback";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let download_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            database_file: data_dir.join("records.sqlite"),
            download_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.download_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .database_file
            .file_name()
            .is_some_and(|n| n == "records.sqlite"));
    }
}
