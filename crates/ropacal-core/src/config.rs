// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, RopacalError};

/// Environment variable carrying the maps SDK credential.
pub const API_KEY_ENV: &str = "ROPACAL_MAPS_API_KEY";

/// Environment variable pointing at a JSON config file.
pub const CONFIG_PATH_ENV: &str = "ROPACAL_CONFIG";

/// Settings read once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name of the bridge channel the UI layer talks on.
    pub channel_name: String,
    /// Name given to the shared navigation engine.
    pub engine_name: String,
    /// Maps/navigation SDK credential. Must be present before any surface connects.
    pub maps_api_key: Option<String>,
    /// How many diagnostics entries are kept in memory.
    pub diagnostics_capacity: usize,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            channel_name: "com.ropacal.app/navigation".into(),
            engine_name: "ropacal.navigation".into(),
            maps_api_key: None,
            diagnostics_capacity: 256,
            log_filter: "info".into(),
        }
    }
}

impl HostConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.as_ref().display(), "loaded host config");
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Build the config from `ROPACAL_CONFIG` (if set) and overlay the
    /// credential from `ROPACAL_MAPS_API_KEY`.
    pub fn from_env_or_default() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay environment overrides onto this config.
    pub fn apply_env(&mut self) {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => self.maps_api_key = Some(key),
            Ok(_) => warn!("{API_KEY_ENV} is set but empty, ignoring"),
            Err(_) => {}
        }
    }

    /// Check the settings the host cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            return Err(RopacalError::Config("channel_name must not be empty".into()));
        }
        if self.engine_name.trim().is_empty() {
            return Err(RopacalError::Config("engine_name must not be empty".into()));
        }
        if self.diagnostics_capacity == 0 {
            return Err(RopacalError::Config(
                "diagnostics_capacity must be at least 1".into(),
            ));
        }
        match self.maps_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(RopacalError::MissingCredential),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> HostConfig {
        HostConfig {
            maps_api_key: Some("test-key".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_name_the_navigation_channel() {
        let config = HostConfig::default();
        assert_eq!(config.channel_name, "com.ropacal.app/navigation");
        assert!(config.maps_api_key.is_none());
    }

    #[test]
    fn missing_credential_fails_validation() {
        let err = HostConfig::default().validate().unwrap_err();
        assert!(matches!(err, RopacalError::MissingCredential));

        let blank = HostConfig {
            maps_api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.validate(), Err(RopacalError::MissingCredential)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = HostConfig {
            diagnostics_capacity: 0,
            ..configured()
        };
        assert!(matches!(config.validate(), Err(RopacalError::Config(_))));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.json");
        let config = HostConfig {
            engine_name: "bench-engine".into(),
            ..configured()
        };
        config.save(&path).unwrap();

        let loaded = HostConfig::load(&path).unwrap();
        assert_eq!(loaded.engine_name, "bench-engine");
        assert_eq!(loaded.maps_api_key.as_deref(), Some("test-key"));
        loaded.validate().unwrap();
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "maps_api_key": "abc" }"#).unwrap();

        let loaded = HostConfig::load(&path).unwrap();
        assert_eq!(loaded.channel_name, "com.ropacal.app/navigation");
        assert_eq!(loaded.diagnostics_capacity, 256);
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            HostConfig::load(&path),
            Err(RopacalError::Serialization(_))
        ));
    }
}
