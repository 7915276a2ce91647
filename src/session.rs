//! The playback session state machine.
//!
//! A [`PlaybackSession`] owns the queue, the handle to the currently
//! loaded engine instance and the bound collaborators; it is the only
//! place session state is mutated, always from the owner thread.

mod machine;
mod types;
mod volume;

pub use machine::PlaybackSession;
pub use types::{PlaybackError, SessionHost, SessionState};

#[cfg(test)]
mod tests;
