//! Engine-facing small types: the capability trait, instance identity,
//! tagged events and the command set understood by the worker thread.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// Identity of one loaded engine instance.
///
/// Every `load` mints a fresh id; events carry the id of the instance
/// that produced them so consumers can discard events from an instance
/// they no longer own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }
}

/// Why a load (or a seek rebuild) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The decoder did not recognize the container/codec. Distinct so a
    /// host can suggest installing or switching codecs.
    UnsupportedFormat,
    /// Any other open/decode error.
    Other(String),
}

/// Asynchronous notifications from the engine, tagged with the instance
/// that produced them.
///
/// For a given instance the order is `Ready`, zero or more `Progress`,
/// then `EndOfMedia`, or a single `Failed`. Events from an already
/// released instance may still arrive afterwards; receivers must check
/// the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The instance finished loading and can be played.
    Ready {
        instance: InstanceId,
        /// Decoder-reported total duration, when the format knows it.
        duration: Option<Duration>,
    },
    /// Periodic playback position while playing.
    Progress {
        instance: InstanceId,
        position: Duration,
    },
    /// The instance played to the end of its media.
    EndOfMedia { instance: InstanceId },
    /// Loading or decoding failed; the instance is gone.
    Failed {
        instance: InstanceId,
        failure: LoadFailure,
    },
}

impl EngineEvent {
    /// The instance this event belongs to.
    pub fn instance(&self) -> InstanceId {
        match self {
            EngineEvent::Ready { instance, .. }
            | EngineEvent::Progress { instance, .. }
            | EngineEvent::EndOfMedia { instance }
            | EngineEvent::Failed { instance, .. } => *instance,
        }
    }
}

/// The capability the session consumes. One live instance at a time;
/// loading a new one releases the previous one first.
pub trait AudioEngine {
    /// Begin loading `path` as a fresh instance and return its id.
    /// Readiness or failure arrives later as a tagged [`EngineEvent`].
    fn load(&mut self, path: &Path) -> InstanceId;
    /// Start or resume playback of the current instance.
    fn play(&mut self);
    /// Pause the current instance.
    fn pause(&mut self);
    /// Stop and release the current instance, if any.
    fn stop(&mut self);
    /// Reposition the current instance to an absolute position.
    fn seek(&mut self, position: Duration);
    /// Set the output volume, `0.0..=1.0`.
    fn set_volume(&mut self, level: f32);
    /// Last known playback position of the current instance.
    fn current_time(&self) -> Duration;
}

/// Errors raised while bringing the engine itself up.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device available: {0}")]
    OutputUnavailable(String),
    #[error("engine worker thread terminated unexpectedly")]
    WorkerGone,
}

/// Commands understood by the engine worker thread.
#[derive(Debug)]
pub(super) enum EngineCmd {
    /// Release any current instance and load `path` under the given id.
    Load { id: InstanceId, path: PathBuf },
    Play,
    Pause,
    Stop,
    /// Rebuild the current sink at an absolute position.
    Seek(Duration),
    SetVolume(f32),
    Quit,
}

/// Shared last-known playback position, updated by the worker.
pub(super) type PositionHandle = Arc<Mutex<Duration>>;
