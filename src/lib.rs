//! Playback session engine for ordered track collections.
//!
//! `rondo` owns a single active listening session: it materializes a
//! [`Queue`] from a host-provided track collection (optionally shuffled),
//! decides which track plays next under loop mode and stop-after-current,
//! and drives a pluggable [`AudioEngine`] while reporting back to a
//! [`SessionHost`] collaborator.
//!
//! The session itself never blocks and is mutated from a single owner
//! thread; engine events arrive on a channel and are applied by calling
//! [`PlaybackSession::drain_engine_events`] from that owner. Events from
//! an already-released engine instance are discarded by instance-id
//! comparison, which doubles as the cancellation mechanism.

pub mod config;
pub mod engine;
pub mod library;
pub mod nav;
pub mod queue;
pub mod session;

pub use config::{ConfigStore, FileConfig, Settings};
pub use engine::{AudioEngine, EngineEvent, InstanceId, RodioEngine};
pub use library::{Track, TrackId};
pub use nav::LoopMode;
pub use queue::Queue;
pub use session::{PlaybackError, PlaybackSession, SessionHost, SessionState};
