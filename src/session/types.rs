use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::library::Track;

/// Where the session is in its lifecycle.
///
/// A current track exists exactly while an engine instance is alive:
/// `Loading` holds the track being decoded, `Playing`/`Paused` the track
/// the engine reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No active track.
    Idle,
    /// An engine instance is loading this track.
    Loading(Arc<Track>),
    /// The engine reached the playing state for this track.
    Playing(Arc<Track>),
    /// Playback is paused mid-track.
    Paused(Arc<Track>),
}

impl SessionState {
    /// The track tied to the live engine instance, if any.
    pub fn current_track(&self) -> Option<&Arc<Track>> {
        match self {
            SessionState::Idle => None,
            SessionState::Loading(t) | SessionState::Playing(t) | SessionState::Paused(t) => {
                Some(t)
            }
        }
    }
}

/// Recoverable, user-facing playback errors.
///
/// Each is reported exactly once through
/// [`SessionHost::on_playback_error`] and leaves the session idle; none
/// are retried automatically, retry is a user action.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The track's underlying audio asset does not exist on disk.
    #[error("audio file missing: {0}")]
    MissingAsset(PathBuf),
    /// The decoder did not recognize the container/codec; a different
    /// engine or codec may be needed.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(PathBuf),
    /// Any other engine-reported media error.
    #[error("media error: {0}")]
    Media(String),
}

/// The UI-side collaborator. All callbacks run on the session's owner
/// thread, during the session method or event drain that triggered them.
pub trait SessionHost {
    /// A new track started playing. `jump_to` asks the host to scroll
    /// its view to the track.
    fn on_new_song_start(&mut self, track: &Arc<Track>, duration: Option<Duration>, jump_to: bool);
    /// The current track ended; `canceled` is false only when it played
    /// to completion. `track` is `None` when a stop was requested with
    /// nothing to attribute it to.
    fn on_song_end(&mut self, track: Option<&Arc<Track>>, canceled: bool);
    /// The whole session came to a stop. Deferred one event-drain tick
    /// after the stop so the engine finishes tearing down first.
    fn on_play_end(&mut self);
    /// Periodic playback position while playing.
    fn on_progress_update(&mut self, position: Duration);
    /// A recoverable playback error occurred; the session is idle again.
    fn on_playback_error(&mut self, track: Option<&Arc<Track>>, error: &PlaybackError);
    /// Whether the session must stop after the in-progress track,
    /// overriding the loop mode.
    fn should_stop_after_song(&self) -> bool;
    /// The track collection a fresh session queue is built from.
    fn current_playlist_tracks(&self) -> Vec<Arc<Track>>;
}
