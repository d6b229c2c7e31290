//! Engine configuration
//!
//! Loaded from JSON; every field is optional and falls back to the values
//! the game ships with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{DeviceSettings, DEFAULT_SAMPLE_RATE};
use crate::error::{Result, SoundError};
use crate::sfx::CueMap;

/// Background loop bus level, low enough to sit under every effect
pub const DEFAULT_BACKGROUND_GAIN: f32 = 0.06;

/// Win fanfare master level
pub const DEFAULT_FANFARE_GAIN: f32 = 0.12;

pub const DEFAULT_BPM: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested device sample rate in Hz
    pub sample_rate: u32,
    /// Output channels (1 or 2)
    pub channels: u16,
    /// Open the device suspended until the first user gesture
    pub start_suspended: bool,
    pub background_gain: f32,
    pub fanfare_gain: f32,
    pub default_bpm: f64,
    /// Directory sample URIs are resolved against
    pub asset_root: PathBuf,
    /// Sound name -> sample URI
    pub sounds: BTreeMap<String, String>,
    pub cues: CueMap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let sounds = [
            ("pickup", "pickup.mp3"),
            ("drop", "drop.mp3"),
            ("success", "success.mp3"),
        ]
        .into_iter()
        .map(|(name, uri)| (name.to_string(), uri.to_string()))
        .collect();

        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            start_suspended: true,
            background_gain: DEFAULT_BACKGROUND_GAIN,
            fanfare_gain: DEFAULT_FANFARE_GAIN,
            default_bpm: DEFAULT_BPM,
            asset_root: PathBuf::from("."),
            sounds,
            cues: CueMap::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    ///
    /// A relative `asset_root` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if config.asset_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.asset_root = dir.join(&config.asset_root);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(SoundError::InvalidConfig { reason }) };

        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".to_string());
        }
        if !(1..=2).contains(&self.channels) {
            return invalid(format!("channels must be 1 or 2, got {}", self.channels));
        }
        for (field, gain) in [
            ("background_gain", self.background_gain),
            ("fanfare_gain", self.fanfare_gain),
        ] {
            if !(0.0..=1.0).contains(&gain) {
                return invalid(format!("{} must be within [0, 1], got {}", field, gain));
            }
        }
        if !self.default_bpm.is_finite() || self.default_bpm <= 0.0 {
            return invalid(format!("default_bpm must be positive, got {}", self.default_bpm));
        }
        Ok(())
    }

    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            sample_rate: self.sample_rate,
            channels: self.channels as usize,
            start_suspended: self.start_suspended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.sounds.get("drop").map(String::as_str), Some("drop.mp3"));
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EngineConfig::from_json_str(
            r#"{"sample_rate": 22050, "start_suspended": false, "cues": {"drop": "pickup"}}"#,
        )
        .unwrap();
        assert_eq!(config.sample_rate, 22050);
        assert!(!config.start_suspended);
        assert_eq!(config.cues.drop, "pickup");
        assert_eq!(config.cues.success, "success");
    }

    #[test]
    fn test_validation_rejects_loud_gain() {
        let err = EngineConfig::from_json_str(r#"{"background_gain": 1.5}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_validation_rejects_bad_channels_and_tempo() {
        assert!(EngineConfig::from_json_str(r#"{"channels": 4}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"default_bpm": 0}"#).is_err());
    }

    #[test]
    fn test_from_file_resolves_asset_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sound.json");
        std::fs::write(&path, r#"{"asset_root": "assets"}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.asset_root, dir.path().join("assets"));
    }
}
