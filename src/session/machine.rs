use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::engine::{AudioEngine, EngineEvent, InstanceId, LoadFailure};
use crate::library::Track;
use crate::nav::{self, LoopMode, Step};
use crate::queue::{Queue, pick_excluding};

use super::types::{PlaybackError, SessionHost, SessionState};
use super::volume::effective_volume;

/// The playback session: one active listening session over an ordered
/// track collection.
///
/// All collaborators are injected at construction; replacing one means
/// constructing a new session. State is mutated only through these
/// methods, from a single owner thread; engine events are applied when
/// the owner calls [`drain_engine_events`](Self::drain_engine_events).
///
/// At most one engine instance is alive at any time. Each `load` mints a
/// fresh [`InstanceId`]; an event whose id does not match the currently
/// owned instance is discarded, which is how superseded loads are
/// cancelled; the engine has no explicit cancel primitive.
pub struct PlaybackSession {
    host: Box<dyn SessionHost>,
    config: Box<dyn ConfigStore>,
    engine: Box<dyn AudioEngine>,
    events: Receiver<EngineEvent>,
    queue: Queue,
    state: SessionState,
    current_instance: Option<InstanceId>,
    pending_jump: bool,
    last_position: Duration,
    play_end_pending: bool,
}

impl PlaybackSession {
    pub fn new(
        host: Box<dyn SessionHost>,
        config: Box<dyn ConfigStore>,
        engine: Box<dyn AudioEngine>,
        events: Receiver<EngineEvent>,
    ) -> Self {
        Self {
            host,
            config,
            engine,
            events,
            queue: Queue::default(),
            state: SessionState::Idle,
            current_instance: None,
            pending_jump: false,
            last_position: Duration::ZERO,
            play_end_pending: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The track tied to the live engine instance, if any.
    pub fn current_track(&self) -> Option<&Arc<Track>> {
        self.state.current_track()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Last engine-reported playback position.
    pub fn position(&self) -> Duration {
        self.last_position
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.config.loop_mode()
    }

    pub fn shuffle_active(&self) -> bool {
        self.config.shuffle_active()
    }

    /// Build a fresh queue from the host's current track collection
    /// (honoring shuffle) and play from the top.
    pub fn start_play(&mut self) {
        let tracks = self.host.current_playlist_tracks();
        self.queue = Queue::build(&tracks, self.config.shuffle_active(), None);
        self.play_at_cursor(true);
    }

    /// Like [`start_play`](Self::start_play), but resume with a specific
    /// track: shuffled queues get it moved to the front, unshuffled
    /// queues keep their order and start the cursor on it.
    pub fn start_play_from(&mut self, track: &Arc<Track>) {
        let tracks = self.host.current_playlist_tracks();
        self.queue = Queue::build(&tracks, self.config.shuffle_active(), Some(track));
        self.play_at_cursor(true);
    }

    /// Load and play the track under the cursor; stops when there is
    /// none.
    pub fn play_at_cursor(&mut self, jump_to: bool) {
        match self.queue.current().cloned() {
            Some(track) => self.play(track, jump_to),
            None => self.stop(),
        }
    }

    /// Load and play `track`, superseding whatever the engine holds.
    pub fn play(&mut self, track: Arc<Track>, jump_to: bool) {
        self.release_current();

        if !track.path().exists() {
            warn!(path = %track.path().display(), "audio asset missing");
            let err = PlaybackError::MissingAsset(track.path().to_path_buf());
            self.host.on_playback_error(Some(&track), &err);
            self.state = SessionState::Idle;
            return;
        }

        let id = self.engine.load(track.path());
        debug!(?id, track = %track.display, "loading");
        self.current_instance = Some(id);
        self.apply_engine_volume(&track);
        self.pending_jump = jump_to;
        self.last_position = Duration::ZERO;
        self.state = SessionState::Loading(track);
    }

    /// Toggle between playing and paused; no-op otherwise.
    pub fn pause_or_resume(&mut self) {
        match self.state.clone() {
            SessionState::Playing(track) => {
                self.engine.pause();
                self.state = SessionState::Paused(track);
            }
            SessionState::Paused(track) => {
                self.engine.play();
                self.state = SessionState::Playing(track);
            }
            SessionState::Idle | SessionState::Loading(_) => {}
        }
    }

    /// Reposition the engine. Unless `is_pausing`, playback resumes
    /// after the seek.
    pub fn seek(&mut self, position: Duration, is_pausing: bool) {
        if self.current_instance.is_none() {
            return;
        }
        self.engine.seek(position);
        self.last_position = position;
        if !is_pausing {
            if let SessionState::Paused(track) = self.state.clone() {
                self.engine.play();
                self.state = SessionState::Playing(track);
            }
        }
    }

    pub fn can_move_forward(&self) -> bool {
        nav::can_move_forward(self.config.loop_mode(), self.queue.len(), self.queue.cursor())
    }

    pub fn can_move_backward(&self) -> bool {
        nav::can_move_backward(self.config.loop_mode(), self.queue.len(), self.queue.cursor())
    }

    /// Advance to the next track under the navigation rules, or stop
    /// when they yield no track.
    pub fn song_queue_forward(&mut self, jump_to: bool) {
        let step = nav::forward_step(
            self.config.loop_mode(),
            self.queue.len(),
            self.queue.cursor(),
            self.host.should_stop_after_song(),
        );
        match step {
            Step::NoTrack => self.stop(),
            Step::At(i) => {
                self.queue.set_cursor(Some(i));
                self.play_at_cursor(jump_to);
            }
            Step::WrapRestart => {
                if self.config.shuffle_active() {
                    self.reshuffle_for_wrap();
                }
                self.queue.set_cursor(Some(0));
                self.play_at_cursor(jump_to);
            }
        }
    }

    /// Move to the previous track under the navigation rules, or stop
    /// when they yield no track.
    pub fn song_queue_backward(&mut self, jump_to: bool) {
        let step = nav::backward_step(
            self.config.loop_mode(),
            self.queue.len(),
            self.queue.cursor(),
            self.host.should_stop_after_song(),
        );
        match step {
            Step::NoTrack => self.stop(),
            Step::At(i) => {
                self.queue.set_cursor(Some(i));
                self.play_at_cursor(jump_to);
            }
            // Backward wraps land on a concrete index; no reshuffle.
            Step::WrapRestart => {}
        }
    }

    /// Release the engine, clear track and cursor, and notify the host.
    /// The play-end notification is deferred one drain tick so the
    /// engine finishes tearing down before the host reads now-playing
    /// state.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.current_instance = None;
        self.state = SessionState::Idle;
        self.queue.clear_cursor();
        self.last_position = Duration::ZERO;
        self.host.on_song_end(None, true);
        self.play_end_pending = true;
    }

    /// Persist a new global volume and re-apply it to the engine.
    pub fn set_global_volume(&mut self, level: f32) {
        self.config.set_global_volume(level);
        self.reapply_volume();
    }

    /// Persist mute and re-apply the effective volume to the engine.
    pub fn set_muted(&mut self, muted: bool) {
        self.config.set_muted(muted);
        self.reapply_volume();
    }

    /// Persist the loop mode; takes effect on the next navigation.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.config.set_loop_mode(mode);
    }

    /// Persist shuffle; takes effect on the next queue build or wrap.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.config.set_shuffle_active(shuffle);
    }

    /// Apply engine events queued since the last call. Must be invoked
    /// from the session's owner thread; the deferred play-end
    /// notification from a stop is delivered at the start of the next
    /// call.
    pub fn drain_engine_events(&mut self) {
        if self.play_end_pending {
            self.play_end_pending = false;
            self.host.on_play_end();
        }
        while let Ok(event) = self.events.try_recv() {
            self.apply_engine_event(event);
        }
    }

    fn apply_engine_event(&mut self, event: EngineEvent) {
        if Some(event.instance()) != self.current_instance {
            // Event from an already-released instance. Discarding it is
            // the cancellation mechanism.
            debug!(?event, "discarding stale engine event");
            return;
        }

        match event {
            EngineEvent::Ready { duration, .. } => self.on_engine_ready(duration),
            EngineEvent::Progress { position, .. } => self.on_engine_progress(position),
            EngineEvent::EndOfMedia { .. } => self.on_engine_end_of_media(),
            EngineEvent::Failed { failure, .. } => self.on_engine_failed(failure),
        }
    }

    fn on_engine_ready(&mut self, duration: Option<Duration>) {
        let SessionState::Loading(track) = self.state.clone() else {
            return;
        };
        if let Some(d) = duration {
            // First write wins; a metadata-derived duration stays.
            track.resolve_duration(d);
        }
        self.engine.play();
        self.state = SessionState::Playing(track.clone());
        debug!(track = %track.display, "playing");
        self.host
            .on_new_song_start(&track, track.duration(), self.pending_jump);
    }

    fn on_engine_progress(&mut self, position: Duration) {
        if !matches!(self.state, SessionState::Playing(_)) {
            return;
        }
        self.last_position = position;
        self.host.on_progress_update(position);
    }

    fn on_engine_end_of_media(&mut self) {
        let Some(track) = self.state.current_track().cloned() else {
            return;
        };
        // The instance is spent; release it without a canceled
        // notification, then advance.
        self.engine.stop();
        self.current_instance = None;
        self.state = SessionState::Idle;
        self.host.on_song_end(Some(&track), false);
        self.song_queue_forward(true);
    }

    fn on_engine_failed(&mut self, failure: LoadFailure) {
        let track = self.state.current_track().cloned();
        self.engine.stop();
        self.current_instance = None;
        self.state = SessionState::Idle;

        let path = track
            .as_ref()
            .map(|t| t.path().to_path_buf())
            .unwrap_or_default();
        let err = match failure {
            LoadFailure::UnsupportedFormat => PlaybackError::UnsupportedFormat(path),
            LoadFailure::Other(message) => PlaybackError::Media(message),
        };
        warn!(%err, "engine failure");
        self.host.on_playback_error(track.as_ref(), &err);
    }

    /// Stop and release whatever the engine holds, telling the host the
    /// superseded track ended as canceled before any new load begins.
    fn release_current(&mut self) {
        if self.current_instance.take().is_some() {
            self.engine.stop();
            let previous = self.state.current_track().cloned();
            self.host.on_song_end(previous.as_ref(), true);
        }
        self.state = SessionState::Idle;
    }

    /// Rebuild a shuffled queue for a loop-all wrap. The new leading
    /// track is drawn uniformly from the finished queue excluding its
    /// last entry, so the wrap never replays the boundary track
    /// back-to-back when more than one track exists.
    fn reshuffle_for_wrap(&mut self) {
        let entries = self.queue.tracks().to_vec();
        let leading = self
            .queue
            .last()
            .and_then(|last| pick_excluding(&entries, last))
            .cloned();
        self.queue = Queue::build(&entries, true, leading.as_ref());
    }

    fn apply_engine_volume(&mut self, track: &Track) {
        let level = effective_volume(
            self.config.global_volume(),
            track.volume_adjustment(),
            self.config.muted(),
        );
        self.engine.set_volume(level);
    }

    fn reapply_volume(&mut self) {
        if let Some(track) = self.state.current_track().cloned() {
            self.apply_engine_volume(&track);
        }
    }
}
