use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use super::thread::spawn_engine_thread;
use super::types::{
    AudioEngine, EngineCmd, EngineError, EngineEvent, InstanceId, PositionHandle,
};

/// Production [`AudioEngine`] backed by a rodio output stream.
///
/// The output stream and the one live sink are owned by a worker thread;
/// this handle sends commands over a channel and mints instance ids so
/// the generation counter stays with the owner.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    position: PositionHandle,
    next_instance: u64,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Spawn the engine worker, handing it the event sender the consumer
    /// will drain. Fails when no audio output device can be opened.
    pub fn spawn(events: Sender<EngineEvent>) -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel();
        let (startup_tx, startup_rx) = mpsc::channel();
        let position: PositionHandle = Arc::new(Mutex::new(Duration::ZERO));

        let join = spawn_engine_thread(rx, events, position.clone(), startup_tx);

        match startup_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                position,
                next_instance: 0,
                join: Some(join),
            }),
            Ok(Err(msg)) => Err(EngineError::OutputUnavailable(msg)),
            Err(_) => Err(EngineError::WorkerGone),
        }
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> InstanceId {
        self.next_instance += 1;
        let id = InstanceId::new(self.next_instance);
        let _ = self.tx.send(EngineCmd::Load {
            id,
            path: path.to_path_buf(),
        });
        id
    }

    fn play(&mut self) {
        let _ = self.tx.send(EngineCmd::Play);
    }

    fn pause(&mut self) {
        let _ = self.tx.send(EngineCmd::Pause);
    }

    fn stop(&mut self) {
        let _ = self.tx.send(EngineCmd::Stop);
    }

    fn seek(&mut self, position: Duration) {
        let _ = self.tx.send(EngineCmd::Seek(position));
    }

    fn set_volume(&mut self, level: f32) {
        let _ = self.tx.send(EngineCmd::SetVolume(level));
    }

    fn current_time(&self) -> Duration {
        self.position.lock().map(|p| *p).unwrap_or(Duration::ZERO)
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.tx.send(EngineCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}
