//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory. A missing file
//! means defaults; a malformed file is an error rather than a silent reset.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Database settings
    pub database: DatabaseSettings,
    /// Progress engine settings
    pub engine: EngineSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            database: DatabaseSettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Full path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.file_name)
    }
}

/// Database-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// File name inside the data directory
    pub file_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            file_name: "rustfit.db".to_string(),
        }
    }
}

/// Progress engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Offset from UTC used to decide which calendar day a workout falls on
    pub utc_offset_minutes: i32,
    /// How far a run's distance may stray from a race distance and still
    /// count toward that distance's pace record
    pub race_distance_tolerance_percent: f64,
    /// Maximum leaderboard rows returned (the requester is always included)
    pub leaderboard_limit: usize,
    /// Days past a plan's end date before an unfinished plan is marked failed
    pub plan_grace_days: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            race_distance_tolerance_percent: 3.0,
            leaderboard_limit: 50,
            plan_grace_days: 7,
        }
    }
}

impl EngineSettings {
    /// The configured UTC offset, clamped to a valid range.
    pub fn utc_offset(&self) -> FixedOffset {
        let seconds = self.utc_offset_minutes.clamp(-14 * 60, 14 * 60) * 60;
        FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "rustfit", "RustFit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path(), get_data_dir())
}

/// Load configuration from an explicit file, using `data_dir` for storage.
pub fn load_config_from(path: &Path, data_dir: PathBuf) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig {
            data_dir,
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to an explicit file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml"), dir.path().to_path_buf())
            .unwrap();
        assert_eq!(config.engine, EngineSettings::default());
        assert_eq!(config.database_path(), dir.path().join("rustfit.db"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.engine.utc_offset_minutes = -300;
        config.engine.leaderboard_limit = 10;
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path, dir.path().to_path_buf()).unwrap();
        assert_eq!(loaded.engine.utc_offset_minutes, -300);
        assert_eq!(loaded.engine.leaderboard_limit, 10);
        assert_eq!(loaded.engine.utc_offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nplan_grace_days = 3\n").unwrap();

        let loaded = load_config_from(&path, dir.path().to_path_buf()).unwrap();
        assert_eq!(loaded.engine.plan_grace_days, 3);
        assert_eq!(loaded.engine.leaderboard_limit, 50);
        assert_eq!(loaded.database.file_name, "rustfit.db");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "engine = [").unwrap();

        let result = load_config_from(&path, dir.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_offset_is_clamped() {
        let settings = EngineSettings {
            utc_offset_minutes: 10_000,
            ..Default::default()
        };
        assert_eq!(settings.utc_offset().local_minus_utc(), 14 * 3600);
    }
}
