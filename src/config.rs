//! Configuration for playback defaults, diagnostics and bundled sounds
//!
//! Loaded from a JSON file at startup so sound assets and the preferred
//! output device can change without recompilation. A missing or malformed
//! file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub sounds: Vec<SoundConfig>,
}

/// Playback defaults applied by owners when they create controllers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Output device name selected after mount; `None` keeps the host default
    #[serde(default)]
    pub default_sink_id: Option<String>,
    /// Loop flag used for sounds that do not set their own
    #[serde(default)]
    pub loop_sounds: bool,
}

/// Diagnostic log sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Broadcast channel capacity for live subscribers
    pub channel_capacity: usize,
    /// Number of entries retained for snapshots
    pub history_capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            history_capacity: 32,
        }
    }
}

/// A sound registered with the sound manager at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoundConfig {
    pub id: String,
    /// File path, `file://` URI or remote URL
    pub src: String,
    #[serde(default)]
    pub loop_playback: Option<bool>,
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or the
    /// JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn load() -> Self {
        Self::load_from_file("assets/audio_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.playback.default_sink_id.is_none());
        assert!(!config.playback.loop_sounds);
        assert_eq!(config.diagnostics.history_capacity, 32);
        assert!(config.sounds.is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "playback": { "default_sink_id": "USB Headset" },
            "sounds": [ { "id": "RING", "src": "sounds/ring.wav", "loop_playback": true } ]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.playback.default_sink_id.as_deref(),
            Some("USB Headset")
        );
        assert_eq!(config.diagnostics.channel_capacity, 64);
        assert_eq!(config.sounds.len(), 1);
        assert_eq!(config.sounds[0].loop_playback, Some(true));
    }

    #[test]
    fn test_partial_diagnostics_section_keeps_sounds() {
        let path = std::env::temp_dir().join("audio_element_partial_diagnostics.json");
        fs::write(
            &path,
            r#"{"diagnostics":{"history_capacity":10},"sounds":[{"id":"RING","src":"ring.wav"}]}"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path);
        assert_eq!(config.diagnostics.history_capacity, 10);
        assert_eq!(config.diagnostics.channel_capacity, 64);
        assert_eq!(config.sounds.len(), 1);
        assert_eq!(config.sounds[0].id, "RING");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("definitely/not/here/audio_config.json");
        assert!(config.sounds.is_empty());
        assert_eq!(config.diagnostics.channel_capacity, 64);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("audio_element_malformed_config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from_file(&path);
        assert!(config.playback.default_sink_id.is_none());

        let _ = fs::remove_file(&path);
    }
}
