//! The two per-set LRU age rules.
//!
//! Within one set the ages of the valid ways always form a permutation of
//! `{0..#valid-1}`: 0 is the most recently touched way, the maximal age the
//! eviction candidate. Two distinct rules maintain this:
//!
//! - [`age_update`] after a **hit** bumps only the ways that were more
//!   recent than the touched one;
//! - [`age_increase`] after an **insert** bumps every way (saturating at
//!   `ways - 1`) before zeroing the inserted one.
//!
//! On a full set both rules produce the same permutation; on a partially
//! valid set only the insert rule extends it correctly.

use crate::cache::CacheEntry;

/// Re-age a set after a hit on (or refresh of) `way`: every way whose age
/// is strictly below the touched way's age is incremented, then the
/// touched way becomes age 0.
pub fn age_update<const WAYS: usize>(set: &mut [CacheEntry; WAYS], way: usize) {
    let touched = set[way].age;
    for entry in set.iter_mut() {
        if entry.age < touched {
            entry.age += 1;
        }
    }
    set[way].age = 0;
}

/// Re-age a set after an insert into `way`: every way's age is incremented
/// saturating at `WAYS - 1`, then the inserted way becomes age 0.
pub fn age_increase<const WAYS: usize>(set: &mut [CacheEntry; WAYS], way: usize) {
    let max = (WAYS - 1) as u8;
    for entry in set.iter_mut() {
        if entry.age < max {
            entry.age += 1;
        }
    }
    set[way].age = 0;
}
