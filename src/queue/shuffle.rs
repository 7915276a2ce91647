//! Randomized ordering helpers for the queue.

use rand::Rng;
use rand::RngExt;
use rand::seq::SliceRandom;

/// Uniform random permutation of `items` (Fisher–Yates).
pub fn shuffle_in_place<T>(items: &mut [T]) {
    items.shuffle(&mut rand::rng());
}

/// Pick one element of `items` uniformly at random, excluding `excluded`.
///
/// Single forward pass, O(1) extra memory: the k-th eligible element
/// replaces the running result with probability `1/k` (reservoir
/// sampling of size 1). Returns `None` when no eligible element exists.
pub fn pick_excluding<'a, T: PartialEq>(items: &'a [T], excluded: &T) -> Option<&'a T> {
    pick_excluding_with(items, excluded, &mut rand::rng())
}

pub(crate) fn pick_excluding_with<'a, T: PartialEq, R: Rng>(
    items: &'a [T],
    excluded: &T,
    rng: &mut R,
) -> Option<&'a T> {
    let mut eligible: u32 = 0;
    let mut result: Option<&T> = None;

    for item in items {
        if item == excluded {
            continue;
        }
        eligible += 1;
        if rng.random_ratio(1, eligible) {
            result = Some(item);
        }
    }

    result
}
