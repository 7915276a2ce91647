use std::path::PathBuf;

use tracing::warn;

use super::load::resolve_config_path;
use super::schema::Settings;
use crate::nav::LoopMode;

/// The externally persisted player state the session consumes: global
/// volume, mute, loop mode and shuffle. Setters are expected to persist.
pub trait ConfigStore {
    fn global_volume(&self) -> f32;
    fn set_global_volume(&mut self, level: f32);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn loop_mode(&self) -> LoopMode;
    fn set_loop_mode(&mut self, mode: LoopMode);
    fn shuffle_active(&self) -> bool;
    fn set_shuffle_active(&mut self, shuffle: bool);
}

/// [`ConfigStore`] over a [`Settings`] tree, writing each change back to
/// its TOML file when a path is attached.
pub struct FileConfig {
    settings: Settings,
    path: Option<PathBuf>,
}

impl FileConfig {
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self { settings, path }
    }

    /// Settings without a backing file; changes stay in memory.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, None)
    }

    /// Load from the default location (env override honored), falling
    /// back to defaults when the file is missing or invalid.
    pub fn from_default_location() -> Self {
        let settings = match Settings::load() {
            Ok(s) => match s.validate() {
                Ok(()) => s,
                Err(msg) => {
                    warn!(%msg, "invalid config, using defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                // Config is optional; failures should not prevent startup.
                warn!(error = %e, "failed to load config, using defaults");
                Settings::default()
            }
        };
        Self::new(settings, resolve_config_path())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn persist(&self) {
        if let Some(path) = &self.path {
            if let Err(e) = self.settings.save_to(path) {
                warn!(error = %e, path = %path.display(), "failed to write config");
            }
        }
    }
}

impl ConfigStore for FileConfig {
    fn global_volume(&self) -> f32 {
        self.settings.audio.global_volume
    }

    fn set_global_volume(&mut self, level: f32) {
        self.settings.audio.global_volume = level.clamp(0.0, 1.0);
        self.persist();
    }

    fn muted(&self) -> bool {
        self.settings.audio.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.settings.audio.muted = muted;
        self.persist();
    }

    fn loop_mode(&self) -> LoopMode {
        self.settings.playback.loop_mode
    }

    fn set_loop_mode(&mut self, mode: LoopMode) {
        self.settings.playback.loop_mode = mode;
        self.persist();
    }

    fn shuffle_active(&self) -> bool {
        self.settings.playback.shuffle
    }

    fn set_shuffle_active(&mut self, shuffle: bool) {
        self.settings.playback.shuffle = shuffle;
        self.persist();
    }
}
