//! Configuration file handling for foodsnap.
//!
//! Loads configuration from `~/.config/foodsnap/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{
    DetectorSettings, DEFAULT_MIN_CONFIDENCE, DEFAULT_REQUIRED_HITS, DEFAULT_TOP_LABELS,
};
use crate::session::{Facing, SessionSettings};

/// Configuration file structure for foodsnap.
/// Loaded from ~/.config/foodsnap/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Which device facing to select: "back", "front", or "external".
    #[serde(default = "default_facing")]
    pub facing: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: default_facing(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default = "default_required_hits")]
    pub required_hits: u32,
    #[serde(default = "default_top_labels")]
    pub top_labels: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            required_hits: default_required_hits(),
            top_labels: default_top_labels(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Whether auto-capture starts enabled.
    #[serde(default = "default_true")]
    pub auto: bool,
    /// Seconds before an undelivered still force-clears the capture guard.
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            auto: true,
            watchdog_secs: default_watchdog_secs(),
        }
    }
}

fn default_facing() -> String {
    "back".to_string()
}

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_required_hits() -> u32 {
    DEFAULT_REQUIRED_HITS
}

fn default_top_labels() -> usize {
    DEFAULT_TOP_LABELS
}

fn default_true() -> bool {
    true
}

fn default_watchdog_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Resolve the configured device facing.
    pub fn facing(&self) -> Result<Facing, ConfigError> {
        match self.camera.facing.to_lowercase().as_str() {
            "back" | "rear" => Ok(Facing::Back),
            "front" => Ok(Facing::Front),
            "external" => Ok(Facing::External),
            other => Err(ConfigError::InvalidValue {
                field: "camera.facing",
                value: other.to_string(),
            }),
        }
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            min_confidence: self.detection.min_confidence,
            required_hits: self.detection.required_hits,
            top_labels: self.detection.top_labels,
        }
    }

    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        Ok(SessionSettings {
            facing: self.facing()?,
            auto_capture: self.capture.auto,
            watchdog: Duration::from_secs(self.capture.watchdog_secs),
        })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        field: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{}' for {}", value, field)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("foodsnap/config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/foodsnap/config.toml")
        })
}
