use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ActivityLogError;
use crate::logging::LogConfig;

/// Largest accepted heart-rate jitter, in bpm
pub const MAX_HEART_RATE_JITTER_BPM: u32 = 20;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Where the profile, goals and log are kept
    pub storage: StorageSettings,

    /// Metrics estimator behaviour
    pub estimator: EstimatorSettings,

    /// Badge thresholds
    pub badges: BadgeThresholds,

    /// Logging setup
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Storage location settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one JSON file per stored key
    pub data_dir: PathBuf,
}

/// Estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Symmetric random offset added to estimated heart rates (0 = deterministic)
    pub heart_rate_jitter_bpm: u32,

    /// Duration used by quick-add when the user gives none
    pub auto_duration_minutes: f64,
}

/// Thresholds for the fixed badge set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeThresholds {
    /// Steps in a single day
    pub daily_steps: u64,

    /// Consecutive active days ending today
    pub streak_days: u32,

    /// Cumulative distance over the whole log
    pub total_distance_km: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            storage: StorageSettings::default(),
            estimator: EstimatorSettings::default(),
            badges: BadgeThresholds::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        ConfigMetadata {
            version: "1.0".to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("activelog"),
        }
    }
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        EstimatorSettings {
            heart_rate_jitter_bpm: 0,
            auto_duration_minutes: 30.0,
        }
    }
}

impl Default for BadgeThresholds {
    fn default() -> Self {
        BadgeThresholds {
            daily_steps: 10_000,
            streak_days: 7,
            total_distance_km: 100.0,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: AppConfig = toml::from_str(&content).map_err(|e| {
            ActivityLogError::Configuration(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.clamp_settings();

        Ok(config)
    }

    /// Pull out-of-range settings back into their accepted range
    fn clamp_settings(&mut self) {
        let jitter = self.estimator.heart_rate_jitter_bpm;
        if jitter > MAX_HEART_RATE_JITTER_BPM {
            eprintln!(
                "heart_rate_jitter_bpm = {} is above {}, using {}",
                jitter, MAX_HEART_RATE_JITTER_BPM, MAX_HEART_RATE_JITTER_BPM
            );
            self.estimator.heart_rate_jitter_bpm = MAX_HEART_RATE_JITTER_BPM;
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".activelog")
            .join("config.toml")
    }

    /// Load configuration from `path`, or from the default path with fallback to defaults.
    ///
    /// Only a missing default file falls back. A file given explicitly must
    /// load, and a file that exists but does not parse is always an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let config_path = Self::default_config_path();
                if !config_path.exists() {
                    eprintln!("Config file not found, using defaults: {}", config_path.display());
                    return Ok(Self::default());
                }
                Self::load_from_file(&config_path)
            }
        }
    }
}
