//! Leaderboard configuration
//!
//! Persisted separately from the score collection, under its own key.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, StorageResult};
use crate::platform::KeyValueStorage;

/// Leaderboard tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key the score collection lives under
    pub storage_key: String,
    /// Rows shown in the rendered view
    pub max_displayed: usize,

    // === Live score ===
    /// Polling interval for the live score (ms)
    pub poll_interval_ms: u32,

    // === Files ===
    /// Download name for exports
    pub export_file_name: String,
    /// Delay before the download object URL is revoked (ms)
    pub export_url_ttl_ms: u32,

    /// Write the preset table when the store is first seen empty
    pub seed_presets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            max_displayed: MAX_DISPLAYED,

            poll_interval_ms: POLL_INTERVAL_MS,

            export_file_name: EXPORT_FILE_NAME.to_string(),
            export_url_ttl_ms: EXPORT_URL_TTL_MS,

            seed_presets: true,
        }
    }
}

impl Config {
    /// Storage key for the config itself
    pub const STORAGE_KEY: &'static str = "fish_leaderboard_settings";

    /// Load config, falling back to defaults on missing or unreadable data
    pub fn load(storage: &dyn KeyValueStorage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Config>(&json) {
                Ok(config) => {
                    log::info!("Loaded leaderboard config");
                    return config.sanitized();
                }
                Err(e) => log::warn!("Ignoring corrupt leaderboard config: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read leaderboard config: {}", e),
        }

        log::info!("Using default leaderboard config");
        Self::default()
    }

    /// Save config
    pub fn save(&self, storage: &dyn KeyValueStorage) -> StorageResult<()> {
        let json = serde_json::to_string(self)?;
        storage.set_item(Self::STORAGE_KEY, &json)?;
        log::info!("Leaderboard config saved");
        Ok(())
    }

    /// Field names accepted by [`Config::set`]
    pub const FIELDS: [&'static str; 6] = [
        "storage_key",
        "max_displayed",
        "poll_interval_ms",
        "export_file_name",
        "export_url_ttl_ms",
        "seed_presets",
    ];

    /// Change one field from its text form.
    ///
    /// Values that [`Config::load`] would replace with a default (empty
    /// names, zero counts or intervals) are rejected.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        let text = value.trim();

        match field {
            "storage_key" | "export_file_name" => {
                if text.is_empty() {
                    return Err(invalid());
                }
                if field == "storage_key" {
                    self.storage_key = text.to_string();
                } else {
                    self.export_file_name = text.to_string();
                }
            }
            "max_displayed" => {
                self.max_displayed = text
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(invalid)?;
            }
            "poll_interval_ms" => {
                self.poll_interval_ms = text
                    .parse::<u32>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(invalid)?;
            }
            "export_url_ttl_ms" => {
                self.export_url_ttl_ms = text.parse::<u32>().map_err(|_| invalid())?;
            }
            "seed_presets" => {
                self.seed_presets = text.parse::<bool>().map_err(|_| invalid())?;
            }
            _ => return Err(ConfigError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    /// Replace values that would break the leaderboard with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.storage_key.is_empty() {
            self.storage_key = defaults.storage_key;
        }
        if self.export_file_name.is_empty() {
            self.export_file_name = defaults.export_file_name;
        }
        if self.max_displayed == 0 {
            self.max_displayed = defaults.max_displayed;
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        self
    }
}
