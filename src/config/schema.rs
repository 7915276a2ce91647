use serde::{Deserialize, Serialize};

use crate::nav::LoopMode;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/rondo/config.toml` or
/// `~/.config/rondo/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `RONDO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub audio: AudioSettings,
    pub library: LibrarySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            audio: AudioSettings::default(),
            library: LibrarySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Default loop mode.
    pub loop_mode: LoopMode,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            loop_mode: LoopMode::NoLoop,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Global output volume, `0.0..=1.0`. Combined multiplicatively with
    /// each track's own volume adjustment.
    pub global_volume: f32,
    /// Whether output starts muted.
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            global_volume: 1.0,
            muted: false,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Which fields to use to build a track's display string, in order.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}
