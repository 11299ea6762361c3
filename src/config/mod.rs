// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the dance trainer.
//!
//! A single YAML file (`trainer.yaml` by default) holds the library
//! location, session defaults and speech settings. Every field has a
//! default, so an empty or missing file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::{SessionConfig, DEFAULT_INTERVAL_SECONDS};
use crate::speech::SpeechSettings;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "trainer.yaml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    /// Path of the library YAML file
    #[serde(default = "default_library")]
    pub library: PathBuf,
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub speech: SpeechSettings,
}

fn default_library() -> PathBuf {
    PathBuf::from("library.yaml")
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            session: SessionDefaults::default(),
            speech: SpeechSettings::default(),
        }
    }
}

impl TrainerConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Load configuration, using defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Library path, resolved against the directory holding the config file
    pub fn library_path(&self, config_path: &Path) -> PathBuf {
        if self.library.is_absolute() {
            return self.library.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.library),
            None => self.library.clone(),
        }
    }

    /// Build a session config, filling unset values from the defaults
    pub fn session_config(
        &self,
        style: Option<&str>,
        track: Option<&str>,
        interval_seconds: Option<u64>,
    ) -> Result<SessionConfig> {
        let style = style
            .or(self.session.style.as_deref())
            .context("No dance style given and no default style configured")?;
        let track = track.or(self.session.track.as_deref()).map(str::to_string);
        let interval = interval_seconds.unwrap_or(self.session.interval_seconds);

        Ok(SessionConfig::new(style, track, interval)?)
    }
}

/// Defaults applied when starting a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDefaults {
    /// Seconds between announcements (5-20)
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Style trained when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Track played when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            style: None,
            track: None,
        }
    }
}
