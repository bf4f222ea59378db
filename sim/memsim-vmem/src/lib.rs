//! # Page Walker
//!
//! Translation of virtual to physical addresses by walking the four levels
//! of memory-resident page directories:
//!
//! ```text
//!  PGD  →  PUD  →  PMD  →  PTE  →  physical page
//! ```
//!
//! Each directory holds 512 little-endian 32-bit entries; an entry is the
//! 4 KiB-aligned physical byte address of the next level's directory (or,
//! at the last level, of the data page itself). The PGD is rooted at
//! physical address 0 of the image.
//!
//! The walker is the common fallback of both TLB variants and of the cache
//! drivers; it reads directly from the flat memory image and never consults
//! a TLB or cache itself. It takes the image as a byte slice so that the
//! memory crate can call it during description-file bring-up without a
//! dependency cycle.
//!
//! ## Errors
//!
//! - [`Error::BadParameter`] when any intermediate base (or the final page)
//!   is not 4 KiB-aligned.
//! - [`Error::WrongAddress`] when a directory entry would be read from
//!   outside the image.

use log::trace;
use memsim_addresses::{PhysAddr, VirtAddr};
use memsim_types::{Error, PAGE_SIZE, Result, WORD_BYTES};

/// Translate `vaddr` into a physical address by walking the page
/// directories resident in `mem`.
///
/// ### Errors
/// See the [crate-level docs](crate).
pub fn page_walk(mem: &[u8], vaddr: VirtAddr) -> Result<PhysAddr> {
    let pud_base = read_page_entry(mem, 0, vaddr.pgd_entry())?;
    ensure_page_aligned(pud_base)?;

    let pmd_base = read_page_entry(mem, pud_base, vaddr.pud_entry())?;
    ensure_page_aligned(pmd_base)?;

    let pte_base = read_page_entry(mem, pmd_base, vaddr.pmd_entry())?;
    ensure_page_aligned(pte_base)?;

    let page = read_page_entry(mem, pte_base, vaddr.pte_entry())?;
    ensure_page_aligned(page)?;

    let paddr = PhysAddr::from_page(page, vaddr.page_offset())?;
    trace!("walked {vaddr:?} -> {paddr:?}");
    Ok(paddr)
}

/// Read the `index`-th 32-bit entry of the directory starting at byte
/// address `page_start`.
fn read_page_entry(mem: &[u8], page_start: u32, index: u16) -> Result<u32> {
    let byte = page_start as usize + index as usize * WORD_BYTES;
    let Some(bytes) = mem.get(byte..byte + WORD_BYTES) else {
        return Err(Error::WrongAddress);
    };

    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(word))
}

fn ensure_page_aligned(base: u32) -> Result<()> {
    if base as usize % PAGE_SIZE == 0 {
        Ok(())
    } else {
        Err(Error::BadParameter)
    }
}
