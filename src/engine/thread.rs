use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStreamBuilder, Sink};
use tracing::debug;

use super::sink::create_sink_at;
use super::types::{EngineCmd, EngineEvent, InstanceId, PositionHandle};

/// Command poll interval; also bounds how late end-of-media is noticed.
const TICK: Duration = Duration::from_millis(200);
/// How often progress events are emitted while playing.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// The one live instance, with `Instant` bookkeeping for its position.
struct Loaded {
    id: InstanceId,
    sink: Sink,
    path: PathBuf,
    paused: bool,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Loaded {
    fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

fn publish_position(handle: &PositionHandle, pos: Duration) {
    if let Ok(mut p) = handle.lock() {
        *p = pos;
    }
}

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    events: Sender<EngineEvent>,
    position: PositionHandle,
    startup: Sender<Result<(), String>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let _ = startup.send(Err(e.to_string()));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for embedding hosts.
        stream.log_on_drop(false);
        let _ = startup.send(Ok(()));

        let mut current: Option<Loaded> = None;
        let mut volume: f32 = 1.0;
        let mut last_progress = Instant::now();

        loop {
            match rx.recv_timeout(TICK) {
                Ok(cmd) => match cmd {
                    EngineCmd::Load { id, path } => {
                        // One live sink at a time: the previous instance is
                        // released before the new one exists.
                        if let Some(prev) = current.take() {
                            prev.sink.stop();
                        }
                        publish_position(&position, Duration::ZERO);

                        match create_sink_at(&stream, &path, Duration::ZERO) {
                            Ok((sink, total)) => {
                                sink.set_volume(volume);
                                let _ = events.send(EngineEvent::Ready {
                                    instance: id,
                                    duration: total,
                                });
                                current = Some(Loaded {
                                    id,
                                    sink,
                                    path,
                                    paused: true,
                                    started_at: None,
                                    accumulated: Duration::ZERO,
                                });
                            }
                            Err(failure) => {
                                debug!(?path, ?failure, "load failed");
                                let _ = events.send(EngineEvent::Failed {
                                    instance: id,
                                    failure,
                                });
                            }
                        }
                    }

                    EngineCmd::Play => {
                        if let Some(cur) = current.as_mut() {
                            if cur.paused {
                                cur.sink.play();
                                cur.paused = false;
                                cur.started_at = Some(Instant::now());
                            }
                        }
                    }

                    EngineCmd::Pause => {
                        if let Some(cur) = current.as_mut() {
                            if !cur.paused {
                                cur.accumulated = cur.position();
                                cur.started_at = None;
                                cur.sink.pause();
                                cur.paused = true;
                            }
                        }
                    }

                    EngineCmd::Stop => {
                        if let Some(cur) = current.take() {
                            cur.sink.stop();
                        }
                        publish_position(&position, Duration::ZERO);
                    }

                    EngineCmd::Seek(pos) => {
                        // Scrubbing: rebuild the sink and skip into the file.
                        if let Some(mut cur) = current.take() {
                            cur.sink.stop();
                            match create_sink_at(&stream, &cur.path, pos) {
                                Ok((sink, _)) => {
                                    sink.set_volume(volume);
                                    if cur.paused {
                                        cur.started_at = None;
                                    } else {
                                        sink.play();
                                        cur.started_at = Some(Instant::now());
                                    }
                                    cur.accumulated = pos;
                                    cur.sink = sink;
                                    publish_position(&position, pos);
                                    current = Some(cur);
                                }
                                Err(failure) => {
                                    let _ = events.send(EngineEvent::Failed {
                                        instance: cur.id,
                                        failure,
                                    });
                                    publish_position(&position, Duration::ZERO);
                                }
                            }
                        }
                    }

                    EngineCmd::SetVolume(level) => {
                        volume = level;
                        if let Some(cur) = current.as_ref() {
                            cur.sink.set_volume(level);
                        }
                    }

                    EngineCmd::Quit => {
                        if let Some(cur) = current.take() {
                            cur.sink.stop();
                        }
                        break;
                    }
                },

                Err(RecvTimeoutError::Timeout) => {
                    // Periodic tick: publish position, emit progress, and
                    // notice when the sink ran out of audio.
                    let mut ended = false;
                    if let Some(cur) = current.as_ref() {
                        if !cur.paused {
                            let pos = cur.position();
                            publish_position(&position, pos);

                            if cur.sink.empty() {
                                let _ = events.send(EngineEvent::EndOfMedia { instance: cur.id });
                                ended = true;
                            } else if last_progress.elapsed() >= PROGRESS_INTERVAL {
                                last_progress = Instant::now();
                                let _ = events.send(EngineEvent::Progress {
                                    instance: cur.id,
                                    position: pos,
                                });
                            }
                        }
                    }
                    if ended {
                        current = None;
                        publish_position(&position, Duration::ZERO);
                    }
                }

                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}
