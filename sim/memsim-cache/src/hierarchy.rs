use crate::cache::{L1Cache, L2Cache};
use log::{debug, trace};
use memsim_addresses::PhysAddr;
use memsim_memory::Memory;
use memsim_types::{Access, LINE_BYTES, LINE_WORDS, Result, Word};

/// Mask selecting the line base of a physical address.
const LINE_MASK: u32 = !(LINE_BYTES as u32 - 1);

/// The complete cache hierarchy: split L1 over a shared, exclusive L2.
///
/// All four access operations ([`read_word`](Self::read_word),
/// [`read_byte`](Self::read_byte), [`write_word`](Self::write_word),
/// [`write_byte`](Self::write_byte)) maintain:
///
/// - **exclusivity**: a physical line is valid in at most one of
///   L1-I/L1-D/L2, and L2 receives only L1 victims;
/// - **write-through**: backing memory is updated before a write returns;
/// - **LRU aging**: see [`lru`](crate::lru).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CacheHierarchy {
    /// L1 cache probed by instruction fetches.
    pub l1i: L1Cache,
    /// L1 cache probed by data accesses.
    pub l1d: L1Cache,
    /// Shared victim L2 cache.
    pub l2: L2Cache,
}

impl CacheHierarchy {
    /// A hierarchy with all three caches flushed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush all three caches.
    pub fn flush(&mut self) {
        self.l1i.flush();
        self.l1d.flush();
        self.l2.flush();
    }

    /// Read the word containing `paddr`.
    ///
    /// Probes the L1 of `access`, then L2 (promoting the line into L1 and
    /// invalidating its L2 slot), and finally fetches the line from
    /// backing memory into L1 alone.
    ///
    /// ### Errors
    /// [`Error::WrongAddress`](memsim_types::Error::WrongAddress) when the
    /// line lies outside the image.
    pub fn read_word(&mut self, mem: &Memory, access: Access, paddr: PhysAddr) -> Result<Word> {
        let phy = paddr.as_u32();
        let w_sel = word_select(phy);
        let Self { l1i, l1d, l2 } = self;
        let l1 = match access {
            Access::Instruction => l1i,
            Access::Data => l1d,
        };

        let set1 = L1Cache::set_index(phy);
        if let Some(way) = l1.lookup(phy) {
            l1.refresh(set1, way);
            trace!("{access:?} read hit (L1) at 0x{phy:08X}");
            return Ok(l1.entry(set1, way).line[w_sel]);
        }

        if let Some(way2) = l2.lookup(phy) {
            let set2 = L2Cache::set_index(phy);
            let line = l2.entry(set2, way2).line;
            l2.invalidate(set2, way2);
            insert_line(l1, l2, phy, line);
            debug!("{access:?} read hit (L2) at 0x{phy:08X}: promoted to L1");
            return Ok(line[w_sel]);
        }

        let line = mem.read_line(phy & LINE_MASK)?;
        insert_line(l1, l2, phy, line);
        debug!("{access:?} read miss at 0x{phy:08X}: line fetched");
        Ok(line[w_sel])
    }

    /// Read the byte at `paddr` by extracting it from the containing word.
    ///
    /// ### Errors
    /// As [`CacheHierarchy::read_word`].
    pub fn read_byte(&mut self, mem: &Memory, access: Access, paddr: PhysAddr) -> Result<u8> {
        let word = self.read_word(mem, access, paddr)?;
        let shift = 8 * (paddr.as_u32() & 0x3);
        Ok(((word >> shift) & 0xFF) as u8)
    }

    /// Write the word containing `paddr` through L1-D to backing memory.
    ///
    /// ### Errors
    /// As [`CacheHierarchy::read_word`].
    pub fn write_word(&mut self, mem: &mut Memory, paddr: PhysAddr, word: Word) -> Result<()> {
        let phy = paddr.as_u32();
        let w_sel = word_select(phy);
        let base = phy & LINE_MASK;
        let Self { l1d, l2, .. } = self;

        let set1 = L1Cache::set_index(phy);
        if let Some(way) = l1d.lookup(phy) {
            let entry = l1d.entry_mut(set1, way);
            entry.line[w_sel] = word;
            let line = entry.line;
            mem.write_line(base, &line)?;
            l1d.refresh(set1, way);
            trace!("write hit (L1-D) at 0x{phy:08X}");
            return Ok(());
        }

        if let Some(way2) = l2.lookup(phy) {
            let set2 = L2Cache::set_index(phy);
            let entry = l2.entry_mut(set2, way2);
            entry.line[w_sel] = word;
            let line = entry.line;
            mem.write_line(base, &line)?;
            l2.invalidate(set2, way2);
            insert_line(l1d, l2, phy, line);
            debug!("write hit (L2) at 0x{phy:08X}: promoted to L1-D");
            return Ok(());
        }

        let mut line = mem.read_line(base)?;
        line[w_sel] = word;
        mem.write_line(base, &line)?;
        // Write-allocate: the freshly written line goes into L1-D only.
        insert_line(l1d, l2, phy, line);
        debug!("write miss at 0x{phy:08X}: line allocated in L1-D");
        Ok(())
    }

    /// Write one byte by reading the containing word, splicing the byte in
    /// and writing the word back.
    ///
    /// ### Errors
    /// As [`CacheHierarchy::read_word`].
    pub fn write_byte(&mut self, mem: &mut Memory, paddr: PhysAddr, byte: u8) -> Result<()> {
        let word = self.read_word(mem, Access::Data, paddr)?;
        let shift = 8 * (paddr.as_u32() & 0x3);
        let patched = (word & !(0xFF << shift)) | (Word::from(byte) << shift);
        self.write_word(mem, paddr, patched)
    }
}

/// Word-in-line selector of a physical address.
#[inline]
const fn word_select(phy: u32) -> usize {
    ((phy >> 2) & 0x3) as usize
}

/// Place `line` (holding `phy`) into its L1 set: an invalid way if one
/// exists, otherwise the LRU way after demoting that victim into L2.
fn insert_line(l1: &mut L1Cache, l2: &mut L2Cache, phy: u32, line: [Word; LINE_WORDS]) {
    let set = L1Cache::set_index(phy);
    let way = match l1.invalid_way(set) {
        Some(way) => way,
        None => {
            let way = l1.lru_way(set);
            let victim_base = l1.line_base(set, way);
            let victim_line = l1.entry(set, way).line;
            demote(l2, victim_base, victim_line);
            way
        }
    };
    l1.insert(set, way, phy, line);
}

/// Receive an L1 victim into L2: an invalid way if one exists, otherwise
/// the L2 set's own LRU way.
fn demote(l2: &mut L2Cache, victim_base: u32, line: [Word; LINE_WORDS]) {
    let set = L2Cache::set_index(victim_base);
    let way = l2
        .invalid_way(set)
        .unwrap_or_else(|| l2.lru_way(set));
    l2.insert(set, way, victim_base, line);
    debug!("demoted line 0x{victim_base:08X} to L2 {set}/{way}");
}
