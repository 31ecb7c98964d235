/*
[INPUT]:  YAML configuration file (optional)
[OUTPUT]: Parsed viewer configuration with defaults
[POS]:    Configuration layer - host startup options
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "logdeck";
const PREFERENCES_FILE: &str = "preferences.json";

/// Top-level configuration for the log viewer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Preference file for formatter settings; defaults to the user config dir
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
    /// Key under which the log view stores its settings
    #[serde(default = "default_preferences_key")]
    pub preferences_key: String,
    /// Tag messages with the file and line that logged them
    #[serde(default)]
    pub record_calling_class: bool,
    /// Number of demo producer threads to start
    #[serde(default)]
    pub demo_producers: usize,
    /// UI tick interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Optional file that receives a copy of every log line
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            preferences_path: None,
            preferences_key: default_preferences_key(),
            record_calling_class: false,
            demo_producers: 0,
            tick_ms: default_tick_ms(),
            log_file: None,
        }
    }
}

fn default_preferences_key() -> String {
    "logging.panel".to_string()
}

fn default_tick_ms() -> u64 {
    250
}

impl ViewerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content).context("parse config yaml")?;
        Ok(config)
    }

    /// Explicit preference path, or `<config dir>/logdeck/preferences.json`.
    pub fn resolved_preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join(PREFERENCES_FILE)))
    }
}
