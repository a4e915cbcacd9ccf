// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration, stored as RON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```ron
//! (
//!     window: (fullscreen: true),
//!     audio: (master_volume: 0.6),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trailer_timeline::SceneScript;

/// The trailer shipped with the player
pub const BUILTIN_SCRIPT: &str = include_str!("../assets/trailer.ron");

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TRAILER_CONFIG";

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "trailer.config.ron";

/// Window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Window title
    pub title: String,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Start in borderless fullscreen
    pub fullscreen: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Style Hub 2026".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

/// Audio settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Whether to open an output device at all
    pub enabled: bool,
    /// Overall volume (0.0 to 1.0)
    pub master_volume: f32,
    /// Bed volume relative to master
    pub bed_volume: f32,
    /// Cue volume relative to master
    pub cue_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 1.0,
            bed_volume: 0.2,
            cue_volume: 0.8,
        }
    }
}

impl AudioSettings {
    /// Effective bed gain
    pub fn bed_gain(&self) -> f32 {
        (self.master_volume * self.bed_volume).clamp(0.0, 1.0)
    }

    /// Effective cue gain
    pub fn cue_gain(&self) -> f32 {
        (self.master_volume * self.cue_volume).clamp(0.0, 1.0)
    }
}

/// Particle background settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSettings {
    /// Number of particles
    pub particle_count: usize,
    /// Radius around the pointer that pushes particles away, in points
    pub pointer_radius: f32,
    /// Overall particle opacity
    pub opacity: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            particle_count: 100,
            pointer_radius: 120.0,
            opacity: 0.4,
        }
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window settings
    pub window: WindowSettings,
    /// Scene script file (`.ron` or `.json`). The built-in trailer when unset.
    pub script: Option<PathBuf>,
    /// Audio settings
    pub audio: AudioSettings,
    /// Background settings
    pub background: BackgroundSettings,
    /// Seconds skipped by the arrow keys
    pub seek_step: f64,
    /// Skip the start screen
    pub autostart: bool,
    /// Show the timecode overlay
    pub show_timecode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            script: None,
            audio: AudioSettings::default(),
            background: BackgroundSettings::default(),
            seek_step: 5.0,
            autostart: false,
            show_timecode: true,
        }
    }
}

impl AppConfig {
    /// Parse a RON config
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Load a config file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_ron(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Relative script paths are relative to the config file
        if let (Some(script), Some(dir)) = (&config.script, path.parent()) {
            if script.is_relative() {
                config.script = Some(dir.join(script));
            }
        }

        Ok(config)
    }

    /// Save the config to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self.to_ron().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Find and load the config.
    ///
    /// Uses [`CONFIG_ENV`] if set, then [`DEFAULT_CONFIG_FILE`] in the working
    /// directory, then the defaults. A file named by the environment must exist.
    pub fn discover() -> std::io::Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            tracing::info!("Loading config from {:?}", path);
            return Self::load(&path);
        }

        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            tracing::info!("Loading config from {:?}", path);
            return Self::load(path);
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load the scene script: `path` if given, then the configured file,
    /// then the built-in trailer.
    pub fn load_script(&self, path: Option<&Path>) -> trailer_timeline::Result<SceneScript> {
        match path.or(self.script.as_deref()) {
            Some(path) => SceneScript::load(path),
            None => {
                let script = SceneScript::from_ron_str(BUILTIN_SCRIPT)?;
                tracing::info!(
                    "Using built-in scene script: {} scenes, {:.2}s",
                    script.len(),
                    script.total_duration()
                );
                Ok(script)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailer_timeline::{SceneId, SceneKind};

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = AppConfig::from_ron("(window: (fullscreen: true), seek_step: 2.5)").unwrap();

        assert!(config.window.fullscreen);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.seek_step, 2.5);
        assert_eq!(config.audio, AudioSettings::default());
        assert!(config.script.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig {
            script: Some(PathBuf::from("scenes/teaser.json")),
            audio: AudioSettings {
                master_volume: 0.5,
                ..AudioSettings::default()
            },
            ..AppConfig::default()
        };

        let text = config.to_ron().unwrap();
        assert_eq!(AppConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_gains_combine_with_master() {
        let audio = AudioSettings {
            master_volume: 0.5,
            ..AudioSettings::default()
        };
        assert!((audio.bed_gain() - 0.1).abs() < 1e-6);
        assert!((audio.cue_gain() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_load_resolves_script_relative_to_file() {
        let dir = std::env::temp_dir().join(format!("trailer_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("player.ron");
        std::fs::write(&path, r#"(script: Some("short.ron"))"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.script, Some(dir.join("short.ron")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_builtin_script_is_valid() {
        let script = AppConfig::default().load_script(None).unwrap();

        assert_eq!(script.len(), 23);
        assert_eq!(script.total_duration(), 96.0);
        assert_eq!(script.scenes()[0].id, SceneId(101));
        assert_eq!(script.scenes()[0].one_shot_cue(), None);
        assert_eq!(script.scene_at(16.0).unwrap().id, SceneId(1));
        assert_eq!(script.scene_at(95.9).unwrap().content.kind, SceneKind::Final);
    }

    #[test]
    fn test_missing_script_file_is_reported() {
        let config = AppConfig {
            script: Some(PathBuf::from("does/not/exist.ron")),
            ..AppConfig::default()
        };
        assert!(config.load_script(None).is_err());
    }

    #[test]
    fn test_invalid_config_is_invalid_data() {
        let dir = std::env::temp_dir().join(format!("trailer_bad_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.ron");
        std::fs::write(&path, "(seek_step: \"fast\")").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
