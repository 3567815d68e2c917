use serde::Deserialize;

/// Module specifier used when the plugin config does not name one.
pub const DEFAULT_TRACKER_PATH: &str = "tracker";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid plugin config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid plugin config: trackerPath must not be empty")]
    EmptyTrackerPath,
}

/// Plugin options, e.g. `["auto_tracker_swc_plugin", { "trackerPath": "@/utils/tracker" }]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Checked against existing imports and used for any inserted import.
    #[serde(default = "default_tracker_path")]
    pub tracker_path: String,
}

fn default_tracker_path() -> String {
    DEFAULT_TRACKER_PATH.to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker_path: default_tracker_path(),
        }
    }
}

impl TrackerConfig {
    pub fn new(tracker_path: impl Into<String>) -> Self {
        Self {
            tracker_path: tracker_path.into(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = serde_json::from_str(raw)?;
        if config.tracker_path.trim().is_empty() {
            return Err(ConfigError::EmptyTrackerPath);
        }
        Ok(config)
    }
}
