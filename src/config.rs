// Persisted user configuration.
// Remembered defaults for the username, limit, export format, and date range.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::write_atomic;
use crate::error::{ActivityError, Result};

/// Saved defaults. Every field is optional; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

impl Config {
    /// Load from `path`. A missing or malformed file yields the default.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed: Result<Config> = fs::read_to_string(path)
            .map_err(ActivityError::from)
            .and_then(|contents| serde_json::from_str(&contents).map_err(ActivityError::from));

        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Write to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, &json)
    }

    /// Overlay the fields set in `other` onto this config.
    pub fn merge(mut self, other: Config) -> Self {
        self.username = other.username.or(self.username);
        self.limit = other.limit.or(self.limit);
        self.export_format = other.export_format.or(self.export_format);
        self.from_date = other.from_date.or(self.from_date);
        self.to_date = other.to_date.or(self.to_date);
        self
    }
}
