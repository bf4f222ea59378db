use bitfield_struct::bitfield;
use core::fmt;
use memsim_types::{Error, PAGE_OFFSET_BITS, Result};

/// Width of one page-directory index field.
const ENTRY_BITS: u32 = 9;

/// A packed 64-bit virtual address.
///
/// Fields from high to low: 16 reserved bits (always zero), the four 9-bit
/// page-directory indices PGD, PUD, PMD, PTE, and the 12-bit page offset.
///
/// ### Semantics
/// - [`VirtAddr::from_parts`] validates every field against its width and
///   fails with [`Error::BadParameter`] on overflow.
/// - [`VirtAddr::from_u64`] discards the reserved bits, so any `u64` is
///   accepted.
/// - [`VirtAddr::page_number`] projects the 36-bit VPN used as TLB tag
///   material.
///
/// ### Invariants
/// - The reserved field is zero in every value produced by this type.
#[bitfield(u64, debug = false)]
#[derive(PartialEq, Eq, Hash)]
pub struct VirtAddr {
    /// Offset of the byte within its 4 KiB page.
    #[bits(12)]
    pub page_offset: u16,
    /// Index into the page-table (fourth-level) directory.
    #[bits(9)]
    pub pte_entry: u16,
    /// Index into the page-middle (third-level) directory.
    #[bits(9)]
    pub pmd_entry: u16,
    /// Index into the page-upper (second-level) directory.
    #[bits(9)]
    pub pud_entry: u16,
    /// Index into the page-global (top-level) directory.
    #[bits(9)]
    pub pgd_entry: u16,
    /// Always zero.
    #[bits(16)]
    reserved: u16,
}

impl VirtAddr {
    /// Build a virtual address from its five fields.
    ///
    /// ### Errors
    /// [`Error::BadParameter`] when any field exceeds its width (9 bits for
    /// the directory indices, 12 bits for the offset).
    pub fn from_parts(
        pgd_entry: u16,
        pud_entry: u16,
        pmd_entry: u16,
        pte_entry: u16,
        page_offset: u16,
    ) -> Result<Self> {
        if pgd_entry >> ENTRY_BITS != 0
            || pud_entry >> ENTRY_BITS != 0
            || pmd_entry >> ENTRY_BITS != 0
            || pte_entry >> ENTRY_BITS != 0
            || page_offset >> PAGE_OFFSET_BITS != 0
        {
            return Err(Error::BadParameter);
        }

        Ok(Self::new()
            .with_pgd_entry(pgd_entry)
            .with_pud_entry(pud_entry)
            .with_pmd_entry(pmd_entry)
            .with_pte_entry(pte_entry)
            .with_page_offset(page_offset))
    }

    /// Build a virtual address from a raw 64-bit word, discarding the
    /// 16 reserved high bits.
    #[inline]
    #[must_use]
    pub const fn from_u64(v: u64) -> Self {
        Self::from_bits(v).with_reserved(0)
    }

    /// Project back to the packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.into_bits()
    }

    /// The 36-bit virtual page number: PGD | PUD | PMD | PTE.
    #[inline]
    #[must_use]
    pub const fn page_number(self) -> u64 {
        self.as_u64() >> PAGE_OFFSET_BITS
    }

    /// Address of the first byte of the containing page.
    #[inline]
    #[must_use]
    pub const fn page_start(self) -> Self {
        self.with_page_offset(0)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for VirtAddr {
    /// The documented dump format, e.g.
    /// `PGD=0x1; PUD=0x0; PMD=0x0; PTE=0x2; offset=0xFF4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PGD=0x{:X}; PUD=0x{:X}; PMD=0x{:X}; PTE=0x{:X}; offset=0x{:X}",
            self.pgd_entry(),
            self.pud_entry(),
            self.pmd_entry(),
            self.pte_entry(),
            self.page_offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsim_types::VIRT_PAGE_NUM_BITS;

    #[test]
    fn from_parts_packs_the_fields() {
        let va = VirtAddr::from_parts(0x1FF, 0x0AA, 0x055, 0x123, 0xFFF).unwrap();
        assert_eq!(va.pgd_entry(), 0x1FF);
        assert_eq!(va.pud_entry(), 0x0AA);
        assert_eq!(va.pmd_entry(), 0x055);
        assert_eq!(va.pte_entry(), 0x123);
        assert_eq!(va.page_offset(), 0xFFF);
    }

    #[test]
    fn from_parts_rejects_oversized_fields() {
        assert_eq!(
            VirtAddr::from_parts(0x200, 0, 0, 0, 0),
            Err(Error::BadParameter)
        );
        assert_eq!(
            VirtAddr::from_parts(0, 0x200, 0, 0, 0),
            Err(Error::BadParameter)
        );
        assert_eq!(
            VirtAddr::from_parts(0, 0, 0x200, 0, 0),
            Err(Error::BadParameter)
        );
        assert_eq!(
            VirtAddr::from_parts(0, 0, 0, 0x200, 0),
            Err(Error::BadParameter)
        );
        assert_eq!(
            VirtAddr::from_parts(0, 0, 0, 0, 0x1000),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn round_trips_over_the_48_meaningful_bits() {
        for v in [
            0u64,
            0x1000,
            0x0000_FFFF_FFFF_FFFF,
            0x0000_1234_5678_9ABC,
            0x0000_8000_0000_0001,
        ] {
            assert_eq!(VirtAddr::from_u64(v).as_u64(), v);
        }
    }

    #[test]
    fn from_u64_discards_reserved_bits() {
        let va = VirtAddr::from_u64(0xDEAD_0000_0000_2FF4);
        assert_eq!(va.as_u64(), 0x2FF4);
    }

    #[test]
    fn page_number_concatenates_the_indices() {
        let va = VirtAddr::from_parts(0x1FF, 0x0AA, 0x055, 0x123, 0xFFF).unwrap();
        let vpn = (0x1FFu64 << 27) | (0x0AA << 18) | (0x055 << 9) | 0x123;
        assert_eq!(va.page_number(), vpn);
        assert!(vpn >> VIRT_PAGE_NUM_BITS == 0);
    }

    #[test]
    fn display_uses_the_documented_format() {
        let va = VirtAddr::from_parts(0x1, 0x0, 0x0, 0x2, 0xFF4).unwrap();
        assert_eq!(
            va.to_string(),
            "PGD=0x1; PUD=0x0; PMD=0x0; PTE=0x2; offset=0xFF4"
        );
    }
}
