use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::sequencer::{TriggerMatch, DEFAULT_TEMPO};
use crate::store::DEFAULT_PRESET;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    clock: ClockConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    ui: UiConfig,
    #[serde(default)]
    preset: PresetConfig,
}

#[derive(Deserialize, Default)]
struct ClockConfig {
    tempo: Option<f64>,
}

#[derive(Deserialize, Default)]
struct PlaybackConfig {
    master_volume: Option<f64>,
    trigger_match: Option<TriggerMatch>,
}

#[derive(Deserialize, Default)]
struct UiConfig {
    frame_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct PresetConfig {
    notes: Option<Vec<(u8, i8)>>,
}

/// Embedded defaults with the user's file laid over them.
pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Load from `explicit` if given, else from the user config dir if a file exists there.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).or_else(user_config_path);
        let user = path.filter(|p| explicit.is_some() || p.exists()).and_then(|p| {
            match std::fs::read_to_string(&p) {
                Ok(contents) => Some((p, contents)),
                Err(e) => {
                    warn!(target: "config", "could not read config {}: {}", p.display(), e);
                    None
                }
            }
        });
        match user {
            Some((p, contents)) => Self::from_sources(Some((p.as_path(), contents.as_str()))),
            None => Self::from_sources(None),
        }
    }

    fn from_sources(user: Option<(&Path, &str)>) -> Self {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            warn!(target: "config", "embedded config is malformed: {}", e);
            ConfigFile::default()
        });

        if let Some((path, contents)) = user {
            match toml::from_str::<ConfigFile>(contents) {
                Ok(user) => merge(&mut base, user),
                Err(e) => {
                    warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                }
            }
        }

        Config { file: base }
    }

    /// Always finite and positive.
    pub fn tempo(&self) -> f64 {
        match self.file.clock.tempo {
            Some(t) if t.is_finite() && t > 0.0 => t,
            Some(t) => {
                warn!(target: "config", "tempo {} must be positive, using {}", t, DEFAULT_TEMPO);
                DEFAULT_TEMPO
            }
            None => DEFAULT_TEMPO,
        }
    }

    /// Clamped to 0..=1.
    pub fn master_volume(&self) -> f64 {
        match self.file.playback.master_volume {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    pub fn trigger_match(&self) -> TriggerMatch {
        self.file.playback.trigger_match.unwrap_or_default()
    }

    /// Frame period in milliseconds, clamped to 1..=1000.
    pub fn frame_ms(&self) -> u64 {
        self.file.ui.frame_ms.unwrap_or(16).clamp(1, 1000)
    }

    /// Preset loaded by the preset command.  Validated when it is loaded, not here.
    pub fn preset(&self) -> Vec<(u8, i8)> {
        self.file
            .preset
            .notes
            .clone()
            .unwrap_or_else(|| DEFAULT_PRESET.to_vec())
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("spinseq")
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spinseq").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.clock.tempo.is_some() {
        base.clock.tempo = user.clock.tempo;
    }
    if user.playback.master_volume.is_some() {
        base.playback.master_volume = user.playback.master_volume;
    }
    if user.playback.trigger_match.is_some() {
        base.playback.trigger_match = user.playback.trigger_match;
    }
    if user.ui.frame_ms.is_some() {
        base.ui.frame_ms = user.ui.frame_ms;
    }
    if user.preset.notes.is_some() {
        base.preset.notes = user.preset.notes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_defaults() {
        let config = Config::from_sources(None);
        assert_eq!(config.tempo(), 80.0);
        assert_eq!(config.master_volume(), 1.0);
        assert_eq!(config.trigger_match(), TriggerMatch::Exact);
        assert_eq!(config.frame_ms(), 16);
        assert_eq!(config.preset(), DEFAULT_PRESET.to_vec());
    }

    #[test]
    fn user_values_override() {
        let user = r#"
            [clock]
            tempo = 120.0

            [playback]
            trigger_match = "window"

            [preset]
            notes = [[0, 4], [7, 3]]
        "#;
        let config = Config::from_sources(Some((Path::new("user.toml"), user)));
        assert_eq!(config.tempo(), 120.0);
        assert_eq!(config.master_volume(), 1.0);
        assert_eq!(config.trigger_match(), TriggerMatch::Window);
        assert_eq!(config.preset(), vec![(0, 4), (7, 3)]);
    }

    #[test]
    fn malformed_user_file_keeps_defaults() {
        let config = Config::from_sources(Some((Path::new("bad.toml"), "[clock\ntempo = ")));
        assert_eq!(config.tempo(), 80.0);
    }

    #[test]
    fn out_of_range_values_are_tamed() {
        let user = "[clock]\ntempo = -3.0\n[playback]\nmaster_volume = 2.5\n[ui]\nframe_ms = 0\n";
        let config = Config::from_sources(Some((Path::new("user.toml"), user)));
        assert_eq!(config.tempo(), DEFAULT_TEMPO);
        assert_eq!(config.master_volume(), 1.0);
        assert_eq!(config.frame_ms(), 1);
    }

    #[test]
    fn load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[playback]\nmaster_volume = 0.25").unwrap();
        let config = Config::load(Some(file.path()));
        assert_eq!(config.master_volume(), 0.25);
        assert_eq!(config.tempo(), 80.0);
    }

    #[test]
    fn missing_explicit_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml")));
        assert_eq!(config.tempo(), 80.0);
    }
}
