//! Fully-associative TLB with list-driven LRU replacement.

use crate::list::IndexList;
use log::{debug, trace};
use memsim_addresses::{PhysAddr, VirtAddr};
use memsim_memory::Memory;
use memsim_types::{Error, Result};
use memsim_vmem::page_walk;
use std::io::Write;

/// Number of entries of the fully-associative TLB.
pub const TLB_LINES: usize = 128;

/// One fully-associative TLB entry: tag is the full 36-bit VPN.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TlbEntry {
    /// Entry holds a live mapping.
    pub valid: bool,
    /// Full virtual page number.
    pub tag: u64,
    /// Mapped 20-bit physical page number.
    pub phy_page_num: u32,
}

/// The 128-entry fully-associative TLB.
///
/// Replacement order lives in a caller-owned [`IndexList`] of line indices,
/// least recently used at the front. The driver seeds the list with all
/// line indices once and then threads it through every call, mirroring how
/// the storage itself is owned by the driver and only borrowed here.
#[derive(Debug, Clone)]
pub struct FaTlb {
    entries: Box<[TlbEntry; TLB_LINES]>,
}

impl Default for FaTlb {
    fn default() -> Self {
        Self::new()
    }
}

impl FaTlb {
    /// A flushed (all-invalid) TLB.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Box::new([TlbEntry::default(); TLB_LINES]),
        }
    }

    /// An access-order list covering every line, front (LRU) to back (MRU)
    /// in index order. The conventional starting point for a fresh TLB.
    #[must_use]
    pub fn fresh_order() -> IndexList {
        let mut order = IndexList::with_capacity(TLB_LINES);
        for line in 0..TLB_LINES {
            order.push_back(line as u32);
        }
        order
    }

    /// Zero every entry.
    pub fn flush(&mut self) {
        self.entries.fill(TlbEntry::default());
    }

    /// All entries, in line order. Used by the drivers' state dumps.
    #[must_use]
    pub fn entries(&self) -> &[TlbEntry] {
        self.entries.as_slice()
    }

    /// Overwrite the entry at `line_index`.
    ///
    /// ### Errors
    /// [`Error::BadParameter`] when `line_index` is out of range.
    pub fn insert(&mut self, line_index: usize, entry: TlbEntry) -> Result<()> {
        let slot = self
            .entries
            .get_mut(line_index)
            .ok_or(Error::BadParameter)?;
        *slot = entry;
        Ok(())
    }

    /// Probe for `vaddr`, scanning lines from most to least recently used.
    ///
    /// On a hit the matching line becomes the most recently used and the
    /// translated physical address is returned.
    pub fn hit(&self, vaddr: VirtAddr, order: &mut IndexList) -> Option<PhysAddr> {
        let vpn = vaddr.page_number();

        let found = order.iter_nodes_rev().find(|&(_, line)| {
            let entry = &self.entries[line as usize];
            entry.valid && entry.tag == vpn
        });

        found.map(|(handle, line)| {
            let entry = &self.entries[line as usize];
            order.move_back(handle);
            trace!("fa-tlb hit: vpn 0x{vpn:09X} at line {line}");
            PhysAddr::new()
                .with_phy_page_num(entry.phy_page_num)
                .with_page_offset(vaddr.page_offset())
        })
    }

    /// Translate `vaddr`, page-walking and filling the LRU line on a miss.
    ///
    /// Returns the physical address and whether the TLB hit.
    ///
    /// ### Errors
    /// The page walker's errors on miss; [`Error::BadParameter`] when the
    /// access-order list is empty.
    pub fn search(
        &mut self,
        mem: &Memory,
        vaddr: VirtAddr,
        order: &mut IndexList,
    ) -> Result<(PhysAddr, bool)> {
        if let Some(paddr) = self.hit(vaddr, order) {
            return Ok((paddr, true));
        }

        let paddr = page_walk(mem.as_bytes(), vaddr)?;
        let lru = order.front_handle().ok_or(Error::BadParameter)?;
        let line = order.value(lru) as usize;
        self.insert(
            line,
            TlbEntry {
                valid: true,
                tag: vaddr.page_number(),
                phy_page_num: paddr.phy_page_num(),
            },
        )?;
        order.move_back(lru);
        debug!(
            "fa-tlb fill: vpn 0x{:09X} -> ppn 0x{:05X} at line {line}",
            vaddr.page_number(),
            paddr.phy_page_num()
        );
        Ok((paddr, false))
    }

    /// Print every entry, one `v; tag; phy_page_num;` line per TLB line.
    ///
    /// ### Errors
    /// [`Error::Io`] on write failure.
    pub fn dump(&self, out: &mut dyn Write) -> Result<()> {
        for entry in self.entries.iter() {
            writeln!(
                out,
                "{}; {:x}; {:05X};",
                u8::from(entry.valid),
                entry.tag,
                entry.phy_page_num
            )?;
        }
        Ok(())
    }
}
