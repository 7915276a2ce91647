use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use crate::config::{FileConfig, Settings};
use crate::engine::{AudioEngine, EngineEvent, InstanceId, LoadFailure};
use crate::library::{Track, TrackId};
use crate::nav::LoopMode;

use super::machine::PlaybackSession;
use super::types::{PlaybackError, SessionHost, SessionState};
use super::volume::effective_volume;

#[derive(Debug, Clone, PartialEq)]
enum HostEvent {
    Start(String, bool),
    End(Option<String>, bool),
    PlayEnd,
    Progress(Duration),
    Error(&'static str),
}

#[derive(Default)]
struct HostLog {
    events: Vec<HostEvent>,
    tracks: Vec<Arc<Track>>,
    stop_after_current: bool,
}

struct FakeHost(Rc<RefCell<HostLog>>);

impl SessionHost for FakeHost {
    fn on_new_song_start(
        &mut self,
        track: &Arc<Track>,
        _duration: Option<Duration>,
        jump_to: bool,
    ) {
        self.0
            .borrow_mut()
            .events
            .push(HostEvent::Start(track.title.clone(), jump_to));
    }

    fn on_song_end(&mut self, track: Option<&Arc<Track>>, canceled: bool) {
        self.0
            .borrow_mut()
            .events
            .push(HostEvent::End(track.map(|t| t.title.clone()), canceled));
    }

    fn on_play_end(&mut self) {
        self.0.borrow_mut().events.push(HostEvent::PlayEnd);
    }

    fn on_progress_update(&mut self, position: Duration) {
        self.0
            .borrow_mut()
            .events
            .push(HostEvent::Progress(position));
    }

    fn on_playback_error(&mut self, _track: Option<&Arc<Track>>, error: &PlaybackError) {
        let label = match error {
            PlaybackError::MissingAsset(_) => "missing",
            PlaybackError::UnsupportedFormat(_) => "unsupported",
            PlaybackError::Media(_) => "media",
        };
        self.0.borrow_mut().events.push(HostEvent::Error(label));
    }

    fn should_stop_after_song(&self) -> bool {
        self.0.borrow().stop_after_current
    }

    fn current_playlist_tracks(&self) -> Vec<Arc<Track>> {
        self.0.borrow().tracks.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EngineCall {
    Load(PathBuf),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    SetVolume(f32),
}

/// Records commands and mints sequential instance ids; tests inject the
/// matching events through the channel themselves.
struct FakeEngine {
    calls: Rc<RefCell<Vec<EngineCall>>>,
    next_instance: u64,
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, path: &std::path::Path) -> InstanceId {
        self.next_instance += 1;
        self.calls
            .borrow_mut()
            .push(EngineCall::Load(path.to_path_buf()));
        InstanceId::new(self.next_instance)
    }

    fn play(&mut self) {
        self.calls.borrow_mut().push(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.calls.borrow_mut().push(EngineCall::Pause);
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(EngineCall::Stop);
    }

    fn seek(&mut self, position: Duration) {
        self.calls.borrow_mut().push(EngineCall::Seek(position));
    }

    fn set_volume(&mut self, level: f32) {
        self.calls.borrow_mut().push(EngineCall::SetVolume(level));
    }

    fn current_time(&self) -> Duration {
        Duration::ZERO
    }
}

struct Fixture {
    session: PlaybackSession,
    host: Rc<RefCell<HostLog>>,
    engine_calls: Rc<RefCell<Vec<EngineCall>>>,
    tx: Sender<EngineEvent>,
    tracks: Vec<Arc<Track>>,
    _dir: tempfile::TempDir,
}

impl Fixture {
    fn events(&self) -> Vec<HostEvent> {
        self.host.borrow().events.clone()
    }

    fn clear_events(&self) {
        self.host.borrow_mut().events.clear();
    }

    fn clear_engine_calls(&self) {
        self.engine_calls.borrow_mut().clear();
    }

    fn ready(&mut self, generation: u64) {
        self.tx
            .send(EngineEvent::Ready {
                instance: InstanceId::new(generation),
                duration: None,
            })
            .unwrap();
        self.session.drain_engine_events();
    }

    fn end_of_media(&mut self, generation: u64) {
        self.tx
            .send(EngineEvent::EndOfMedia {
                instance: InstanceId::new(generation),
            })
            .unwrap();
        self.session.drain_engine_events();
    }

    fn loaded_paths(&self) -> Vec<PathBuf> {
        self.engine_calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Load(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

fn fixture(names: &[&str], loop_mode: LoopMode, shuffle: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let tracks: Vec<Arc<Track>> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let path = dir.path().join(format!("{name}.mp3"));
            std::fs::write(&path, b"fake audio").unwrap();
            Arc::new(Track::new(
                TrackId(i as u64),
                path,
                (*name).into(),
                None,
                None,
                (*name).into(),
            ))
        })
        .collect();

    let host = Rc::new(RefCell::new(HostLog {
        tracks: tracks.clone(),
        ..HostLog::default()
    }));
    let engine_calls = Rc::new(RefCell::new(Vec::new()));
    let (tx, rx) = mpsc::channel();

    let mut settings = Settings::default();
    settings.playback.loop_mode = loop_mode;
    settings.playback.shuffle = shuffle;

    let session = PlaybackSession::new(
        Box::new(FakeHost(host.clone())),
        Box::new(FileConfig::in_memory(settings)),
        Box::new(FakeEngine {
            calls: engine_calls.clone(),
            next_instance: 0,
        }),
        rx,
    );

    Fixture {
        session,
        host,
        engine_calls,
        tx,
        tracks,
        _dir: dir,
    }
}

#[test]
fn lifecycle_no_loop_plays_through_and_stops() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::NoLoop, false);

    fx.session.start_play();
    assert!(matches!(fx.session.state(), SessionState::Loading(t) if t.title == "A"));

    fx.ready(1);
    assert!(matches!(fx.session.state(), SessionState::Playing(t) if t.title == "A"));

    fx.end_of_media(1);
    fx.ready(2);
    fx.end_of_media(2);
    fx.ready(3);
    fx.end_of_media(3);
    // One more drain delivers the deferred play-end notification.
    fx.session.drain_engine_events();

    assert_eq!(
        fx.events(),
        vec![
            HostEvent::Start("A".into(), true),
            HostEvent::End(Some("A".into()), false),
            HostEvent::Start("B".into(), true),
            HostEvent::End(Some("B".into()), false),
            HostEvent::Start("C".into(), true),
            HostEvent::End(Some("C".into()), false),
            HostEvent::End(None, true),
            HostEvent::PlayEnd,
        ],
    );
    assert_eq!(*fx.session.state(), SessionState::Idle);
    assert_eq!(fx.session.queue().cursor(), None);
}

#[test]
fn superseding_a_load_discards_the_stale_ready() {
    let mut fx = fixture(&["A", "B"], LoopMode::NoLoop, false);

    let a = fx.tracks[0].clone();
    let b = fx.tracks[1].clone();
    fx.session.play(a, false);
    fx.session.play(b, false);

    // Instance 1 was released before its ready arrived.
    fx.ready(1);
    assert!(matches!(fx.session.state(), SessionState::Loading(t) if t.title == "B"));

    fx.ready(2);
    assert!(matches!(fx.session.state(), SessionState::Playing(t) if t.title == "B"));

    assert_eq!(
        fx.events(),
        vec![
            HostEvent::End(Some("A".into()), true),
            HostEvent::Start("B".into(), false),
        ],
    );
}

#[test]
fn stale_end_of_media_does_not_advance() {
    let mut fx = fixture(&["A", "B"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.ready(1);
    fx.session.play(fx.tracks[1].clone(), false);

    // End-of-media from the released instance must not advance the queue.
    fx.end_of_media(1);
    assert!(matches!(fx.session.state(), SessionState::Loading(t) if t.title == "B"));
    assert_eq!(fx.loaded_paths().len(), 2);
}

#[test]
fn stop_after_current_stops_even_under_loop_all() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::LoopAll, false);

    fx.session.start_play();
    fx.ready(1);
    fx.host.borrow_mut().stop_after_current = true;

    fx.end_of_media(1);
    fx.session.drain_engine_events();

    assert_eq!(
        fx.events(),
        vec![
            HostEvent::Start("A".into(), true),
            HostEvent::End(Some("A".into()), false),
            HostEvent::End(None, true),
            HostEvent::PlayEnd,
        ],
    );
    // Only the first track was ever loaded.
    assert_eq!(fx.loaded_paths().len(), 1);
    assert_eq!(*fx.session.state(), SessionState::Idle);
}

#[test]
fn missing_asset_reports_and_stays_idle_without_an_engine_instance() {
    let fx_dir = tempfile::tempdir().unwrap();
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    let ghost = Arc::new(Track::new(
        TrackId(99),
        fx_dir.path().join("does-not-exist.mp3"),
        "Ghost".into(),
        None,
        None,
        "Ghost".into(),
    ));
    fx.session.play(ghost, false);

    assert_eq!(fx.events(), vec![HostEvent::Error("missing")]);
    assert!(fx.engine_calls.borrow().is_empty());
    assert_eq!(*fx.session.state(), SessionState::Idle);
}

#[test]
fn unsupported_format_is_reported_distinctly() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.tx
        .send(EngineEvent::Failed {
            instance: InstanceId::new(1),
            failure: LoadFailure::UnsupportedFormat,
        })
        .unwrap();
    fx.session.drain_engine_events();

    assert_eq!(fx.events(), vec![HostEvent::Error("unsupported")]);
    assert_eq!(*fx.session.state(), SessionState::Idle);
}

#[test]
fn generic_media_failure_is_reported_and_clears_state() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.ready(1);
    fx.tx
        .send(EngineEvent::Failed {
            instance: InstanceId::new(1),
            failure: LoadFailure::Other("decode went sideways".into()),
        })
        .unwrap();
    fx.session.drain_engine_events();

    assert_eq!(
        fx.events(),
        vec![
            HostEvent::Start("A".into(), true),
            HostEvent::Error("media"),
        ],
    );
    assert_eq!(*fx.session.state(), SessionState::Idle);
    assert_eq!(fx.session.current_track(), None);
}

#[test]
fn pause_or_resume_toggles_between_playing_and_paused() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    // No-op while idle.
    fx.session.pause_or_resume();
    assert!(fx.engine_calls.borrow().is_empty());

    fx.session.start_play();
    fx.ready(1);
    fx.clear_engine_calls();

    fx.session.pause_or_resume();
    assert!(matches!(fx.session.state(), SessionState::Paused(_)));
    assert_eq!(*fx.engine_calls.borrow(), vec![EngineCall::Pause]);

    fx.session.pause_or_resume();
    assert!(matches!(fx.session.state(), SessionState::Playing(_)));
    assert_eq!(
        *fx.engine_calls.borrow(),
        vec![EngineCall::Pause, EngineCall::Play],
    );
}

#[test]
fn seek_resumes_playback_unless_pausing() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.ready(1);
    fx.session.pause_or_resume();
    fx.clear_engine_calls();

    fx.session.seek(Duration::from_secs(30), false);
    assert!(matches!(fx.session.state(), SessionState::Playing(_)));
    assert_eq!(fx.session.position(), Duration::from_secs(30));
    assert_eq!(
        *fx.engine_calls.borrow(),
        vec![EngineCall::Seek(Duration::from_secs(30)), EngineCall::Play],
    );

    fx.session.pause_or_resume();
    fx.clear_engine_calls();
    fx.session.seek(Duration::from_secs(5), true);
    assert!(matches!(fx.session.state(), SessionState::Paused(_)));
    assert_eq!(
        *fx.engine_calls.borrow(),
        vec![EngineCall::Seek(Duration::from_secs(5))],
    );
}

#[test]
fn seek_is_a_no_op_without_an_instance() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);
    fx.session.seek(Duration::from_secs(10), false);
    assert!(fx.engine_calls.borrow().is_empty());
}

#[test]
fn loop_one_replays_the_same_track() {
    let mut fx = fixture(&["A", "B"], LoopMode::LoopOne, false);

    fx.session.start_play();
    fx.ready(1);
    fx.end_of_media(1);

    assert_eq!(fx.session.queue().cursor(), Some(0));
    let paths = fx.loaded_paths();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], paths[1]);

    fx.ready(2);
    assert!(matches!(fx.session.state(), SessionState::Playing(t) if t.title == "A"));
}

#[test]
fn backward_at_queue_start_wraps_under_loop_all() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::LoopAll, false);

    fx.session.start_play();
    fx.ready(1);
    fx.session.song_queue_backward(false);

    assert_eq!(fx.session.queue().cursor(), Some(2));
    let paths = fx.loaded_paths();
    assert_eq!(paths.len(), 2);
    assert!(paths[1].ends_with("C.mp3"));
}

#[test]
fn forward_gating_follows_loop_mode() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::NoLoop, false);
    fx.session.start_play();
    fx.ready(1);
    assert!(fx.session.can_move_forward());
    assert!(!fx.session.can_move_backward());

    fx.session.set_loop_mode(LoopMode::LoopAll);
    assert!(fx.session.can_move_backward());
}

#[test]
fn wrap_reshuffles_excluding_the_boundary_track() {
    for _ in 0..10 {
        let mut fx = fixture(&["A", "B", "C", "D", "E"], LoopMode::LoopAll, true);

        fx.session.start_play();
        fx.ready(1);

        // Walk the shuffled queue to its last entry.
        for generation in 1..=4u64 {
            fx.end_of_media(generation);
            fx.ready(generation + 1);
        }
        assert_eq!(fx.session.queue().cursor(), Some(4));

        let old_ids: Vec<TrackId> = fx.session.queue().tracks().iter().map(|t| t.id).collect();
        let boundary = *old_ids.last().unwrap();

        fx.end_of_media(5);

        let new_queue = fx.session.queue();
        assert_eq!(new_queue.cursor(), Some(0));
        assert_eq!(new_queue.len(), 5);

        let mut new_ids: Vec<TrackId> = new_queue.tracks().iter().map(|t| t.id).collect();
        assert_ne!(new_ids[0], boundary, "wrap must not replay the boundary track");

        let mut old_sorted = old_ids.clone();
        old_sorted.sort();
        new_ids.sort();
        assert_eq!(new_ids, old_sorted, "wrap keeps the same track multiset");
    }
}

#[test]
fn wrap_without_shuffle_restarts_from_the_top_in_order() {
    let mut fx = fixture(&["A", "B"], LoopMode::LoopAll, false);

    fx.session.start_play();
    fx.ready(1);
    fx.end_of_media(1);
    fx.ready(2);
    fx.end_of_media(2);

    assert_eq!(fx.session.queue().cursor(), Some(0));
    let paths = fx.loaded_paths();
    assert_eq!(paths.len(), 3);
    assert!(paths[2].ends_with("A.mp3"));
}

#[test]
fn start_play_with_empty_playlist_stops_cleanly() {
    let mut fx = fixture(&[], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.session.drain_engine_events();

    assert_eq!(
        fx.events(),
        vec![HostEvent::End(None, true), HostEvent::PlayEnd],
    );
    assert_eq!(*fx.session.state(), SessionState::Idle);
    assert!(fx.loaded_paths().is_empty());
}

#[test]
fn start_play_from_positions_the_cursor_unshuffled() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::NoLoop, false);

    let c = fx.tracks[2].clone();
    fx.session.start_play_from(&c);

    assert_eq!(fx.session.queue().cursor(), Some(2));
    assert!(fx.loaded_paths()[0].ends_with("C.mp3"));
    let ids: Vec<TrackId> = fx.session.queue().tracks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TrackId(0), TrackId(1), TrackId(2)]);
}

#[test]
fn start_play_from_leads_the_shuffled_queue() {
    let mut fx = fixture(&["A", "B", "C"], LoopMode::NoLoop, true);

    let b = fx.tracks[1].clone();
    fx.session.start_play_from(&b);

    assert_eq!(fx.session.queue().cursor(), Some(0));
    assert_eq!(fx.session.queue().at(0).unwrap().id, TrackId(1));
}

#[test]
fn first_engine_duration_is_memoized_but_never_overwritten() {
    let mut fx = fixture(&["A"], LoopMode::LoopOne, false);

    fx.session.start_play();
    fx.tx
        .send(EngineEvent::Ready {
            instance: InstanceId::new(1),
            duration: Some(Duration::from_secs(100)),
        })
        .unwrap();
    fx.session.drain_engine_events();
    assert_eq!(fx.tracks[0].duration(), Some(Duration::from_secs(100)));

    // Replay the same track; a differing engine duration must lose.
    fx.end_of_media(1);
    fx.tx
        .send(EngineEvent::Ready {
            instance: InstanceId::new(2),
            duration: Some(Duration::from_secs(42)),
        })
        .unwrap();
    fx.session.drain_engine_events();
    assert_eq!(fx.tracks[0].duration(), Some(Duration::from_secs(100)));
}

#[test]
fn progress_is_forwarded_only_while_playing() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.ready(1);
    fx.clear_events();

    fx.tx
        .send(EngineEvent::Progress {
            instance: InstanceId::new(1),
            position: Duration::from_secs(1),
        })
        .unwrap();
    fx.session.drain_engine_events();
    assert_eq!(
        fx.events(),
        vec![HostEvent::Progress(Duration::from_secs(1))],
    );
    assert_eq!(fx.session.position(), Duration::from_secs(1));

    fx.session.pause_or_resume();
    fx.clear_events();
    fx.tx
        .send(EngineEvent::Progress {
            instance: InstanceId::new(1),
            position: Duration::from_secs(2),
        })
        .unwrap();
    fx.session.drain_engine_events();
    assert!(fx.events().is_empty());
    assert_eq!(fx.session.position(), Duration::from_secs(1));
}

#[test]
fn volume_changes_reach_the_engine_and_respect_mute() {
    let mut fx = fixture(&["A"], LoopMode::NoLoop, false);

    fx.session.start_play();
    fx.ready(1);
    fx.clear_engine_calls();

    fx.session.set_muted(true);
    assert_eq!(*fx.engine_calls.borrow(), vec![EngineCall::SetVolume(0.0)]);

    fx.clear_engine_calls();
    fx.session.set_muted(false);
    fx.session.set_global_volume(0.5);
    assert_eq!(
        *fx.engine_calls.borrow(),
        vec![EngineCall::SetVolume(1.0), EngineCall::SetVolume(0.5)],
    );
}

#[test]
fn effective_volume_combines_clamped_factors() {
    assert_eq!(effective_volume(1.0, 1.0, false), 1.0);
    assert_eq!(effective_volume(0.5, 0.5, false), 0.25);
    assert_eq!(effective_volume(0.5, 0.5, true), 0.0);
    // Each factor is clamped independently before the product.
    assert_eq!(effective_volume(2.0, 1.0, false), 1.0);
    assert_eq!(effective_volume(-1.0, 1.0, false), 0.0);
    assert_eq!(effective_volume(1.0, 0.0, false), 0.01);
    assert_eq!(effective_volume(1.0, 5.0, false), 1.0);
}
