//! Two-level hierarchy of direct-mapped TLBs.
//!
//! Instruction fetches and data accesses each probe their own 16-line L1
//! TLB; both share a 64-line L2 TLB. All three are direct-mapped: for a
//! table of `LINES` lines, the line index is `VPN mod LINES` and the tag
//! the remaining high VPN bits.

use log::{debug, trace};
use memsim_addresses::{PhysAddr, VirtAddr};
use memsim_memory::Memory;
use memsim_types::{Access, Result};
use memsim_vmem::page_walk;
use std::io::Write;

/// Lines of each L1 TLB (instruction and data).
pub const L1_TLB_LINES: usize = 16;

/// Lines of the shared L2 TLB.
pub const L2_TLB_LINES: usize = 64;

/// One direct-mapped TLB entry.
///
/// The tag width depends on the owning table (32 − log2 lines of the VPN's
/// 36 bits); entries store it unpacked.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TlbEntry {
    /// Entry holds a live mapping.
    pub valid: bool,
    /// VPN with the index bits stripped.
    pub tag: u32,
    /// Mapped 20-bit physical page number.
    pub phy_page_num: u32,
}

/// A direct-mapped TLB of `LINES` lines.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tlb<const LINES: usize> {
    entries: [TlbEntry; LINES],
}

/// The L1 instruction/data TLB shape.
pub type L1Tlb = Tlb<L1_TLB_LINES>;

/// The L2 TLB shape.
pub type L2Tlb = Tlb<L2_TLB_LINES>;

impl<const LINES: usize> Default for Tlb<LINES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LINES: usize> Tlb<LINES> {
    /// Bits of the VPN consumed by the line index.
    pub const INDEX_BITS: u32 = LINES.trailing_zeros();

    /// A flushed (all-invalid) table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [TlbEntry {
                valid: false,
                tag: 0,
                phy_page_num: 0,
            }; LINES],
        }
    }

    /// Zero every entry.
    pub fn flush(&mut self) {
        self.entries = Self::new().entries;
    }

    /// Line index for a VPN.
    #[inline]
    #[must_use]
    pub const fn index_of(vpn: u64) -> usize {
        (vpn as usize) % LINES
    }

    /// Tag for a VPN.
    #[inline]
    #[must_use]
    pub const fn tag_of(vpn: u64) -> u32 {
        (vpn >> Self::INDEX_BITS) as u32
    }

    /// The VPN a line would map if its tag is taken at face value,
    /// reconstructed at full width (valid bit ignored).
    #[inline]
    #[must_use]
    pub const fn vpn_at(&self, line: usize) -> u64 {
        ((self.entries[line].tag as u64) << Self::INDEX_BITS) | line as u64
    }

    /// The entry at `line`.
    #[inline]
    #[must_use]
    pub const fn entry(&self, line: usize) -> TlbEntry {
        self.entries[line]
    }

    /// All entries, in line order. Used by the drivers' state dumps.
    #[must_use]
    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    /// Probe for a VPN; `Some(phy_page_num)` on hit.
    #[must_use]
    pub fn lookup(&self, vpn: u64) -> Option<u32> {
        let entry = &self.entries[Self::index_of(vpn)];
        (entry.valid && entry.tag == Self::tag_of(vpn)).then_some(entry.phy_page_num)
    }

    /// Map `vpn` to `phy_page_num`, overwriting whatever occupied its line.
    pub fn insert(&mut self, vpn: u64, phy_page_num: u32) {
        self.entries[Self::index_of(vpn)] = TlbEntry {
            valid: true,
            tag: Self::tag_of(vpn),
            phy_page_num,
        };
    }

    /// Clear the valid bit of `line`.
    pub fn invalidate(&mut self, line: usize) {
        self.entries[line].valid = false;
    }

    /// Print every entry as `v; tag; phy_page_num;`, with dash placeholders
    /// for invalid lines.
    ///
    /// ### Errors
    /// [`Error::Io`](memsim_types::Error::Io) on write failure.
    pub fn dump(&self, out: &mut dyn Write) -> Result<()> {
        for entry in &self.entries {
            if entry.valid {
                writeln!(out, "1; {:08X}; {:05X};", entry.tag, entry.phy_page_num)?;
            } else {
                writeln!(out, "0; --------; -----;")?;
            }
        }
        Ok(())
    }
}

/// Result of a [`TlbHierarchy::translate`] call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Translation {
    /// The translated physical address.
    pub paddr: PhysAddr,
    /// Whether any TLB level supplied the mapping (miss means the page
    /// tables were walked).
    pub hit: bool,
}

/// The full TLB hierarchy: per-kind L1 tables over a shared L2.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TlbHierarchy {
    /// L1 TLB probed by instruction fetches.
    pub itlb: L1Tlb,
    /// L1 TLB probed by data accesses.
    pub dtlb: L1Tlb,
    /// Shared second-level TLB.
    pub l2: L2Tlb,
}

impl TlbHierarchy {
    /// A hierarchy with all three tables flushed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            itlb: L1Tlb::new(),
            dtlb: L1Tlb::new(),
            l2: L2Tlb::new(),
        }
    }

    /// Flush all three tables.
    pub fn flush(&mut self) {
        self.itlb.flush();
        self.dtlb.flush();
        self.l2.flush();
    }

    /// Translate `vaddr` for an access of kind `access`.
    ///
    /// Probes the access's L1 table, then L2 (refilling the L1 line on an
    /// L2 hit), and finally walks the page tables. The walk path first runs
    /// the **stale-line invalidation**: inserting the new mapping into L2
    /// evicts whatever its line held, and if the *other* kind's L1 still
    /// maps that evicted VPN, that L1 line is invalidated so no stale copy
    /// outlives its L2 backing. The new mapping is then inserted into both
    /// L2 and the access's L1.
    ///
    /// ### Errors
    /// The page walker's errors on a full miss.
    pub fn translate(
        &mut self,
        mem: &Memory,
        vaddr: VirtAddr,
        access: Access,
    ) -> Result<Translation> {
        let vpn = vaddr.page_number();
        let Self { itlb, dtlb, l2 } = self;
        let (l1, other) = match access {
            Access::Instruction => (itlb, dtlb),
            Access::Data => (dtlb, itlb),
        };

        if let Some(ppn) = l1.lookup(vpn) {
            trace!("{access:?} tlb hit (L1): vpn 0x{vpn:09X}");
            return Ok(Translation {
                paddr: paddr_of(ppn, vaddr),
                hit: true,
            });
        }

        if let Some(ppn) = l2.lookup(vpn) {
            trace!("{access:?} tlb hit (L2): vpn 0x{vpn:09X}");
            l1.insert(vpn, ppn);
            return Ok(Translation {
                paddr: paddr_of(ppn, vaddr),
                hit: true,
            });
        }

        let paddr = page_walk(mem.as_bytes(), vaddr)?;

        // Stale-line invalidation before the L2 line is overwritten.
        let evicted_vpn = l2.vpn_at(L2Tlb::index_of(vpn));
        let other_line = L1Tlb::index_of(vpn);
        if other.entry(other_line).valid && other.vpn_at(other_line) == evicted_vpn {
            debug!(
                "{:?} tlb: invalidating stale vpn 0x{evicted_vpn:09X} at line {other_line}",
                access.other()
            );
            other.invalidate(other_line);
        }

        l2.insert(vpn, paddr.phy_page_num());
        l1.insert(vpn, paddr.phy_page_num());
        debug!(
            "{access:?} tlb fill: vpn 0x{vpn:09X} -> ppn 0x{:05X}",
            paddr.phy_page_num()
        );
        Ok(Translation { paddr, hit: false })
    }
}

#[inline]
fn paddr_of(phy_page_num: u32, vaddr: VirtAddr) -> PhysAddr {
    PhysAddr::new()
        .with_phy_page_num(phy_page_num)
        .with_page_offset(vaddr.page_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsim_types::PAGE_SIZE;

    fn zero_image() -> Memory {
        Memory::from_bytes(vec![0u8; PAGE_SIZE])
    }

    fn va(vpn: u64, offset: u64) -> VirtAddr {
        VirtAddr::from_u64((vpn << 12) | offset)
    }

    #[test]
    fn index_and_tag_slicing() {
        let vpn = 0x0F_FFFF_FFFFu64;
        assert_eq!(L1Tlb::index_of(vpn), 0xF);
        assert_eq!(L1Tlb::tag_of(vpn), 0xFFFF_FFFF);
        assert_eq!(L2Tlb::index_of(vpn), 0x3F);
        assert_eq!(L2Tlb::tag_of(vpn), 0x3FFF_FFFF);
    }

    #[test]
    fn miss_fills_both_levels() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();
        let t = tlbs
            .translate(&mem, va(0x21, 0xABC), Access::Instruction)
            .unwrap();
        assert!(!t.hit);
        assert_eq!(t.paddr.page_offset(), 0xABC);
        assert!(tlbs.itlb.lookup(0x21).is_some());
        assert!(tlbs.l2.lookup(0x21).is_some());
        assert!(tlbs.dtlb.lookup(0x21).is_none());

        let t = tlbs
            .translate(&mem, va(0x21, 0), Access::Instruction)
            .unwrap();
        assert!(t.hit);
    }

    #[test]
    fn l2_hit_refills_the_missing_l1() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();
        tlbs.translate(&mem, va(0x21, 0), Access::Instruction)
            .unwrap();
        assert!(tlbs.dtlb.lookup(0x21).is_none());

        // The data side misses its L1 but finds the mapping in L2.
        let t = tlbs.translate(&mem, va(0x21, 0x10), Access::Data).unwrap();
        assert!(t.hit);
        assert!(tlbs.dtlb.lookup(0x21).is_some());
    }

    #[test]
    fn l1_conflict_overwrites_the_line() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();
        // Same L1 line (index 1), different tags.
        tlbs.translate(&mem, va(0x01, 0), Access::Data).unwrap();
        tlbs.translate(&mem, va(0x11, 0), Access::Data).unwrap();
        assert!(tlbs.dtlb.lookup(0x01).is_none());
        assert!(tlbs.dtlb.lookup(0x11).is_some());
        // Both still live in distinct L2 lines.
        assert!(tlbs.l2.lookup(0x01).is_some());
        assert!(tlbs.l2.lookup(0x11).is_some());
    }

    #[test]
    fn l2_eviction_invalidates_the_stale_other_kind_l1_line() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();

        // Instruction miss promotes VPN 0x21 into L1-I and L2.
        tlbs.translate(&mem, va(0x21, 0), Access::Instruction)
            .unwrap();
        assert!(tlbs.itlb.lookup(0x21).is_some());

        // Data miss on VPN 0x61 evicts L2 line 0x21 (same index mod 64)
        // while L1-I still holds 0x21: the stale L1-I line must go.
        let t = tlbs.translate(&mem, va(0x61, 0), Access::Data).unwrap();
        assert!(!t.hit);
        assert!(tlbs.itlb.lookup(0x21).is_none());
        assert!(tlbs.dtlb.lookup(0x61).is_some());
        assert!(tlbs.l2.lookup(0x61).is_some());
    }

    #[test]
    fn unrelated_l2_eviction_leaves_the_other_l1_alone() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();

        // L1-I line 1 holds VPN 0x21; L2 line 0x21 holds it too.
        tlbs.translate(&mem, va(0x21, 0), Access::Instruction)
            .unwrap();
        // Data miss on VPN 0x101: L1 line 1, L2 line 1. The VPN evicted
        // from L2 line 1 is not what L1-I line 1 holds, so it survives.
        tlbs.translate(&mem, va(0x101, 0), Access::Data).unwrap();
        assert!(tlbs.itlb.lookup(0x21).is_some());
    }

    #[test]
    fn flush_is_idempotent() {
        let mem = zero_image();
        let mut tlbs = TlbHierarchy::new();
        tlbs.translate(&mem, va(0x21, 0), Access::Data).unwrap();

        tlbs.flush();
        let once = tlbs.clone();
        tlbs.flush();
        assert_eq!(tlbs, once);
        assert_eq!(tlbs, TlbHierarchy::new());
    }

    #[test]
    fn dump_renders_valid_and_invalid_lines() {
        let mut tlb = L1Tlb::new();
        tlb.insert(0x21, 0xABCDE);
        let mut out = Vec::new();
        tlb.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), L1_TLB_LINES);
        assert_eq!(lines[0], "0; --------; -----;");
        assert_eq!(lines[1], "1; 00000002; ABCDE;");
    }
}
