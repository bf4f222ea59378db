use crate::lru;
use memsim_types::{LINE_WORDS, Result, Word};
use std::io::Write;

/// One cache entry, shared by all levels.
///
/// The age and tag widths differ per level (2/3 age bits, 22/19 tag bits)
/// but only have to round-trip through the dump format, so the entry
/// stores them unpacked.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheEntry {
    /// Entry holds a live line.
    pub valid: bool,
    /// LRU age; 0 is most recently used.
    pub age: u8,
    /// `phy >> (log2(sets) + 4)` of the cached line.
    pub tag: u32,
    /// The cached four-word line.
    pub line: [Word; LINE_WORDS],
}

/// A `WAYS`-way set-associative, physically indexed cache of `SETS` sets.
///
/// ### Invariants
/// - A valid entry at set `i` satisfies `tag == phy >> TAG_SHIFT` and
///   `(phy >> 4) mod SETS == i` for the line's physical address.
/// - Within one set the valid ways' ages form a permutation of
///   `{0..#valid-1}` (see [`lru`]).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cache<const WAYS: usize, const SETS: usize> {
    sets: Vec<[CacheEntry; WAYS]>,
}

/// The L1 instruction/data cache shape: 4 ways × 64 sets.
pub type L1Cache = Cache<4, 64>;

/// The L2 cache shape: 8 ways × 512 sets.
pub type L2Cache = Cache<8, 512>;

impl<const WAYS: usize, const SETS: usize> Default for Cache<WAYS, SETS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WAYS: usize, const SETS: usize> Cache<WAYS, SETS> {
    /// Bits of the physical address consumed by the set index.
    pub const INDEX_BITS: u32 = SETS.trailing_zeros();

    /// Shift that strips byte, word and set-index bits, leaving the tag.
    pub const TAG_SHIFT: u32 = Self::INDEX_BITS + 4;

    /// A flushed (all-invalid) cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: vec![[CacheEntry::default(); WAYS]; SETS],
        }
    }

    /// Zero every entry.
    pub fn flush(&mut self) {
        self.sets.fill([CacheEntry::default(); WAYS]);
    }

    /// Set index of a physical address.
    #[inline]
    #[must_use]
    pub const fn set_index(phy: u32) -> usize {
        ((phy >> 4) as usize) % SETS
    }

    /// Tag of a physical address.
    #[inline]
    #[must_use]
    pub const fn tag_of(phy: u32) -> u32 {
        phy >> Self::TAG_SHIFT
    }

    /// Physical base address of the line cached at (`set`, `way`),
    /// reconstructed from the stored tag.
    #[inline]
    #[must_use]
    pub fn line_base(&self, set: usize, way: usize) -> u32 {
        ((self.sets[set][way].tag << Self::INDEX_BITS) | set as u32) << 4
    }

    /// The entry at (`set`, `way`).
    #[inline]
    #[must_use]
    pub fn entry(&self, set: usize, way: usize) -> &CacheEntry {
        &self.sets[set][way]
    }

    pub(crate) fn entry_mut(&mut self, set: usize, way: usize) -> &mut CacheEntry {
        &mut self.sets[set][way]
    }

    /// All sets, in index order. Used by dumps and invariant checks.
    #[must_use]
    pub fn sets(&self) -> &[[CacheEntry; WAYS]] {
        &self.sets
    }

    /// Probe for the line containing `phy`; `Some(way)` on hit.
    #[must_use]
    pub fn lookup(&self, phy: u32) -> Option<usize> {
        let tag = Self::tag_of(phy);
        self.sets[Self::set_index(phy)]
            .iter()
            .position(|e| e.valid && e.tag == tag)
    }

    /// Mark `way` most recently used after a hit.
    pub fn refresh(&mut self, set: usize, way: usize) {
        lru::age_update(&mut self.sets[set], way);
    }

    /// Place a line for `phy` into `way`, aging the set with the insert
    /// rule.
    pub fn insert(&mut self, set: usize, way: usize, phy: u32, line: [Word; LINE_WORDS]) {
        self.sets[set][way] = CacheEntry {
            valid: true,
            age: self.sets[set][way].age,
            tag: Self::tag_of(phy),
            line,
        };
        lru::age_increase(&mut self.sets[set], way);
    }

    /// Drop the entry at (`set`, `way`).
    pub fn invalidate(&mut self, set: usize, way: usize) {
        self.sets[set][way] = CacheEntry::default();
    }

    /// The first invalid way of `set`, if any.
    #[must_use]
    pub fn invalid_way(&self, set: usize) -> Option<usize> {
        self.sets[set].iter().position(|e| !e.valid)
    }

    /// The eviction victim of `set`: the way with the maximal age, ties
    /// resolved to the lowest way index.
    #[must_use]
    pub fn lru_way(&self, set: usize) -> usize {
        let mut victim = 0;
        for (way, entry) in self.sets[set].iter().enumerate().skip(1) {
            if entry.age > self.sets[set][victim].age {
                victim = way;
            }
        }
        victim
    }

    /// Print every entry as `way/set: v, age, tag, (w0 w1 w2 w3)`, with
    /// dash placeholders for invalid entries.
    ///
    /// ### Errors
    /// [`Error::Io`](memsim_types::Error::Io) on write failure.
    pub fn dump(&self, out: &mut dyn Write) -> Result<()> {
        for way in 0..WAYS {
            for (set_index, set) in self.sets.iter().enumerate() {
                let entry = &set[way];
                if entry.valid {
                    writeln!(
                        out,
                        "{way}/{set_index:03}: {}, {}, 0x{:06X}, ({:08X} {:08X} {:08X} {:08X})",
                        u8::from(entry.valid),
                        entry.age,
                        entry.tag,
                        entry.line[0],
                        entry.line[1],
                        entry.line[2],
                        entry.line[3],
                    )?;
                } else {
                    writeln!(
                        out,
                        "{way}/{set_index:03}: 0, -, --------, (-------- -------- -------- --------)"
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_slicing_matches_the_documented_widths() {
        assert_eq!(L1Cache::INDEX_BITS, 6);
        assert_eq!(L1Cache::TAG_SHIFT, 10);
        assert_eq!(L2Cache::INDEX_BITS, 9);
        assert_eq!(L2Cache::TAG_SHIFT, 13);

        let phy = 0x0001_1FF4;
        assert_eq!(L1Cache::set_index(phy), (0x11FF4 >> 4) & 0x3F);
        assert_eq!(L1Cache::tag_of(phy), 0x11FF4 >> 10);
        assert_eq!(L2Cache::set_index(phy), (0x11FF4 >> 4) & 0x1FF);
        assert_eq!(L2Cache::tag_of(phy), 0x11FF4 >> 13);
    }

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut cache = L1Cache::new();
        let phy = 0x0001_1FF4;
        let set = L1Cache::set_index(phy);
        assert!(cache.lookup(phy).is_none());

        cache.insert(set, 0, phy, [1, 2, 3, 4]);
        let way = cache.lookup(phy).unwrap();
        assert_eq!(way, 0);
        assert_eq!(cache.entry(set, way).line, [1, 2, 3, 4]);
        assert_eq!(cache.entry(set, way).age, 0);
        assert_eq!(cache.line_base(set, way), phy & !0xF);
    }

    #[test]
    fn distinct_tags_in_the_same_set_do_not_alias() {
        let mut cache = L1Cache::new();
        // Both map to set 0; tags differ.
        cache.insert(0, 0, 0x0000_0000, [0xA; LINE_WORDS]);
        cache.insert(0, 1, 0x0000_0400, [0xB; LINE_WORDS]);
        assert_eq!(cache.lookup(0x0000_0000), Some(0));
        assert_eq!(cache.lookup(0x0000_0400), Some(1));
        assert_eq!(cache.lookup(0x0000_0800), None);
    }

    #[test]
    fn lru_victim_ties_resolve_to_the_lowest_way() {
        let mut cache = L1Cache::new();
        for way in 0..4 {
            cache.entry_mut(0, way).age = 0;
        }
        assert_eq!(cache.lru_way(0), 0);

        cache.entry_mut(0, 2).age = 3;
        cache.entry_mut(0, 3).age = 3;
        assert_eq!(cache.lru_way(0), 2);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut cache = L1Cache::new();
        cache.insert(5, 2, 0x1540, [9; LINE_WORDS]);
        cache.flush();
        let once = cache.clone();
        cache.flush();
        assert_eq!(cache, once);
        assert_eq!(cache, L1Cache::new());
    }

    #[test]
    fn dump_renders_valid_and_invalid_entries() {
        let mut cache = L1Cache::new();
        cache.insert(0, 0, 0x0001_0000, [0, 0x11111111, 0x22222222, 0x33333333]);
        let mut out = Vec::new();
        cache.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 * 64);
        assert_eq!(
            lines[0],
            "0/000: 1, 0, 0x000040, (00000000 11111111 22222222 33333333)"
        );
        assert_eq!(
            lines[1],
            "0/001: 0, -, --------, (-------- -------- -------- --------)"
        );
    }
}
