//! Session-local play order: an ordered sequence of track references
//! plus a cursor.
//!
//! The queue is materialized when a session starts (optionally shuffled)
//! and re-materialized on a loop-all wrap; it is distinct from the
//! playlist's declared order, which stays authoritative when shuffle is
//! off.

use std::sync::Arc;

use crate::library::Track;

mod shuffle;

pub use shuffle::{pick_excluding, shuffle_in_place};

/// Ordered track references with a cursor.
///
/// The cursor is either `None` ("no track selected / stop requested") or
/// a valid index into the entries.
#[derive(Debug, Default, Clone)]
pub struct Queue {
    entries: Vec<Arc<Track>>,
    cursor: Option<usize>,
}

impl Queue {
    /// Build a fresh queue from `tracks`.
    ///
    /// When `shuffled`, the whole sequence gets a uniform random
    /// permutation; a `leading` track is then moved to index 0 so a
    /// "resume with this track" start doesn't consume its shuffle slot
    /// twice. When not shuffled the declared order is kept as-is and
    /// `leading` only positions the cursor.
    pub fn build(tracks: &[Arc<Track>], shuffled: bool, leading: Option<&Arc<Track>>) -> Self {
        let mut entries: Vec<Arc<Track>> = tracks.to_vec();
        let mut cursor = if entries.is_empty() { None } else { Some(0) };

        if shuffled {
            shuffle_in_place(&mut entries);
            if let Some(lead) = leading {
                if let Some(pos) = entries.iter().position(|t| t == lead) {
                    let t = entries.remove(pos);
                    entries.insert(0, t);
                }
            }
        } else if let Some(lead) = leading {
            if let Some(pos) = entries.iter().position(|t| t == lead) {
                cursor = Some(pos);
            }
        }

        Self { entries, cursor }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn at(&self, i: usize) -> Option<&Arc<Track>> {
        self.entries.get(i)
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Move the cursor. Out-of-range indices clear it instead of
    /// leaving the queue pointing nowhere valid.
    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        debug_assert!(cursor.is_none_or(|c| c < self.entries.len()));
        self.cursor = cursor.filter(|&c| c < self.entries.len());
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// The entry under the cursor, if any.
    pub fn current(&self) -> Option<&Arc<Track>> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// The last entry of the queue, if any.
    pub fn last(&self) -> Option<&Arc<Track>> {
        self.entries.last()
    }
}
