//! Navigation rules: whether the session may move forward/backward
//! through the queue, and where the cursor lands when it does.
//!
//! These are pure functions over loop mode, queue length, cursor and the
//! stop-after-current override, so the session can stay the only place
//! that mutates state.

use serde::{Deserialize, Serialize};

/// What happens at the end of the current queue.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopMode {
    /// Stop when the queue runs out.
    #[default]
    #[serde(alias = "no_loop", alias = "none")]
    NoLoop,
    /// Wrap around to the start of the queue (reshuffling when shuffle
    /// is active).
    #[serde(alias = "loop_all", alias = "all", alias = "loop-around")]
    LoopAll,
    /// Repeat the current track when it ends.
    #[serde(alias = "loop_one", alias = "single", alias = "repeat-one")]
    LoopOne,
}

/// Outcome of a navigation request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// No track to move to; the session should stop.
    NoTrack,
    /// Move the cursor to this index (may equal the current one when the
    /// loop mode restarts the same track).
    At(usize),
    /// Past the end with loop-all: restart from index 0, rebuilding the
    /// queue first when shuffle is active.
    WrapRestart,
}

/// Whether a forward move is currently allowed.
///
/// Looping modes always allow it for a non-empty queue; otherwise the
/// cursor must not sit on the last entry.
pub fn can_move_forward(loop_mode: LoopMode, queue_len: usize, cursor: Option<usize>) -> bool {
    if queue_len == 0 {
        return false;
    }
    match loop_mode {
        LoopMode::LoopAll | LoopMode::LoopOne => true,
        LoopMode::NoLoop => cursor.is_some_and(|c| c + 1 < queue_len),
    }
}

/// Whether a backward move is currently allowed. Symmetric to
/// [`can_move_forward`].
pub fn can_move_backward(loop_mode: LoopMode, queue_len: usize, cursor: Option<usize>) -> bool {
    if queue_len == 0 {
        return false;
    }
    match loop_mode {
        LoopMode::LoopAll | LoopMode::LoopOne => true,
        LoopMode::NoLoop => cursor.is_some_and(|c| c > 0),
    }
}

/// Cursor movement for a forward request.
///
/// `stop_after_current` overrides every loop rule and forces
/// [`Step::NoTrack`].
pub fn forward_step(
    loop_mode: LoopMode,
    queue_len: usize,
    cursor: Option<usize>,
    stop_after_current: bool,
) -> Step {
    if stop_after_current {
        return Step::NoTrack;
    }
    let Some(cur) = cursor.filter(|&c| c < queue_len) else {
        return Step::NoTrack;
    };

    match loop_mode {
        LoopMode::LoopOne => Step::At(cur),
        LoopMode::LoopAll if cur + 1 >= queue_len => Step::WrapRestart,
        LoopMode::NoLoop if cur + 1 >= queue_len => Step::NoTrack,
        _ => Step::At(cur + 1),
    }
}

/// Cursor movement for a backward request. Wraps to the last index under
/// loop-all; no reshuffle happens on a backward wrap.
pub fn backward_step(
    loop_mode: LoopMode,
    queue_len: usize,
    cursor: Option<usize>,
    stop_after_current: bool,
) -> Step {
    if stop_after_current {
        return Step::NoTrack;
    }
    let Some(cur) = cursor.filter(|&c| c < queue_len) else {
        return Step::NoTrack;
    };

    match loop_mode {
        LoopMode::LoopOne => Step::At(cur),
        LoopMode::LoopAll if cur == 0 => Step::At(queue_len - 1),
        LoopMode::NoLoop if cur == 0 => Step::NoTrack,
        _ => Step::At(cur - 1),
    }
}
