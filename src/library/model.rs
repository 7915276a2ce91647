use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Lower bound for the per-track volume adjustment.
const MIN_VOLUME_ADJUSTMENT: f32 = 0.01;

/// Stable identity of a track within the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

/// A single audio track known to the catalog.
///
/// Duration is resolved lazily: the scanner fills it from file
/// properties when tags are readable, otherwise the first engine-reported
/// duration lands in the same set-once cell. Later writes are ignored.
#[derive(Debug)]
pub struct Track {
    pub id: TrackId,
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub display: String,
    duration: OnceLock<Duration>,
    volume_adjustment: f32,
}

impl Track {
    pub fn new(
        id: TrackId,
        path: PathBuf,
        title: String,
        artist: Option<String>,
        album: Option<String>,
        display: String,
    ) -> Self {
        Self {
            id,
            path,
            title,
            artist,
            album,
            display,
            duration: OnceLock::new(),
            volume_adjustment: 1.0,
        }
    }

    /// Set the per-track volume adjustment, clamped to `[0.01, 1.0]`.
    pub fn with_volume_adjustment(mut self, adjustment: f32) -> Self {
        self.volume_adjustment = adjustment.clamp(MIN_VOLUME_ADJUSTMENT, 1.0);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached duration, if any source has resolved it yet.
    pub fn duration(&self) -> Option<Duration> {
        self.duration.get().copied()
    }

    /// Resolve the duration if it has not been resolved before.
    /// First write wins; later calls are no-ops.
    pub fn resolve_duration(&self, duration: Duration) {
        let _ = self.duration.set(duration);
    }

    pub fn volume_adjustment(&self) -> f32 {
        self.volume_adjustment
    }
}

// Identity is the catalog id; metadata edits don't change which track it is.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}
