// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use crate::geo::{LatLon, MELBOURNE_CBD};
use crate::map::{Viewport, INITIAL_ZOOM};
use crate::search::SearchOptions;
use crate::ParkError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub initial_center: LatLon,
    pub initial_zoom: f64,
    /// Position reported for "My Location". Without it geolocation is refused.
    pub home_location: Option<LatLon>,
    pub viewport: ViewportSize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            debounce_ms: 1000,
            request_timeout_secs: 15,
            initial_center: MELBOURNE_CBD,
            initial_zoom: INITIAL_ZOOM,
            home_location: None,
            viewport: ViewportSize::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join(CONFIG_FILE)
    }

    /// Loads `path`, or the platform default when `None`.
    ///
    /// A missing default file yields the defaults. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ParkError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if !path.exists() {
                    debug!("No config at {}; using defaults", path.display());
                    return Ok(Self::default());
                }
                Self::from_file(&path)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ParkError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParkError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ParkError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        info!("Loaded config — path={}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ParkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ParkError::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ParkError> {
        if self.backend_url.trim().is_empty() {
            return Err(ParkError::Config("backend_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ParkError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ParkError::Config("viewport must have a positive size".into()));
        }
        Ok(())
    }

    /// Flag or environment value wins over the file.
    pub fn with_backend_override(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.backend_url = url;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_options(&self, enter_on_empty_selects_my_location: bool) -> SearchOptions {
        SearchOptions {
            debounce: self.debounce(),
            enter_on_empty_selects_my_location,
        }
    }

    pub fn initial_viewport(&self) -> Viewport {
        let mut viewport = Viewport::new(self.viewport.width, self.viewport.height);
        viewport.center = self.initial_center;
        viewport.zoom = self.initial_zoom;
        viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.initial_viewport().center, MELBOURNE_CBD);
        assert_eq!(config.initial_viewport().zoom, 13.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"debounce_ms": 250, "home_location": {"lat": -37.81, "lon": 144.96}}"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.home_location, Some(LatLon::new(-37.81, 144.96)));
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ParkError::Config(_))));

        fs::write(&path, r#"{"request_timeout_secs": 0}"#).unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ParkError::Config(_))));
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(Config::load(Some(&missing)), Err(ParkError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            backend_url: "http://parking.example:9000".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_backend_override() {
        let config = Config::default().with_backend_override(Some("http://other:1".into()));
        assert_eq!(config.backend_url, "http://other:1");
        let config = Config::default().with_backend_override(Some("  ".into()));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }
}
