//! Output volume combination.
//!
//! The global volume and a track's own adjustment combine
//! multiplicatively, each clamped to its range first; mute wins over
//! both.

/// Smallest per-track adjustment, matching the track model's clamp.
const MIN_TRACK_ADJUSTMENT: f32 = 0.01;

/// Effective engine volume for a track.
pub(crate) fn effective_volume(global: f32, track_adjustment: f32, muted: bool) -> f32 {
    if muted {
        return 0.0;
    }
    global.clamp(0.0, 1.0) * track_adjustment.clamp(MIN_TRACK_ADJUSTMENT, 1.0)
}
