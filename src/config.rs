// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Read once at startup from `<config_dir>/clipsmith/config.toml`. Every
//! field has a default, so a missing file or a partial one is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`AppConfig::api_url`].
pub const API_URL_ENV: &str = "CLIPSMITH_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the editing server's API
    pub api_url: String,
    /// Per-request timeout; transforms upload whole videos, so keep it generous
    pub request_timeout_secs: u64,
    /// mpv executable used for previews
    pub mpv_binary: String,
    /// Length of a quick-marked caption
    pub quick_caption_secs: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            mpv_binary: "mpv".to_string(),
            quick_caption_secs: crate::session::DEFAULT_QUICK_CAPTION_SECS,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8000/api";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

    /// Load from the default location, then apply the environment override.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(config_path()?)?;
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, toml).with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    fn apply_env_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            log::info!("Using API URL from {}: {}", API_URL_ENV, url);
            self.api_url = url.trim().to_string();
        }
    }

    fn sanitized(mut self) -> Self {
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = Self::DEFAULT_TIMEOUT_SECS;
        }
        if !self.quick_caption_secs.is_finite() || self.quick_caption_secs <= 0.0 {
            self.quick_caption_secs = crate::session::DEFAULT_QUICK_CAPTION_SECS;
        }
        if self.mpv_binary.trim().is_empty() {
            self.mpv_binary = "mpv".to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Unable to determine config directory")?;
    Ok(dir.join("clipsmith").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://127.0.0.1:8000/api");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = \"https://edit.example.com/api\"\nquick_caption_secs = -2.0\n")
            .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.api_url, "https://edit.example.com/api");
        assert_eq!(config.request_timeout_secs, AppConfig::DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.quick_caption_secs, 3.0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            mpv_binary: "/opt/mpv/bin/mpv".into(),
            request_timeout_secs: 30,
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();
        assert_eq!(AppConfig::load_from_path(&path).unwrap(), config);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = [").unwrap();
        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        config.apply_env_override(Some("   ".into()));
        assert_eq!(config.api_url, AppConfig::DEFAULT_API_URL);
        config.apply_env_override(Some(" http://10.0.0.2:9000/api ".into()));
        assert_eq!(config.api_url, "http://10.0.0.2:9000/api");
    }
}
