use bitfield_struct::bitfield;
use core::fmt;
use memsim_types::{Error, PAGE_OFFSET_BITS, PAGE_SIZE, PHY_PAGE_NUM_BITS, Result};

/// A packed 32-bit physical address: 20-bit physical page number over a
/// 12-bit page offset.
///
/// ### Semantics
/// - [`PhysAddr::from_page`] builds an address from a 4 KiB-aligned page
///   base and an in-page offset, validating both.
/// - [`PhysAddr::from_u32`] reinterprets any raw 32-bit address; it cannot
///   fail because every `u32` slices into a valid (page, offset) pair.
#[bitfield(u32, debug = false)]
#[derive(PartialEq, Eq, Hash)]
pub struct PhysAddr {
    /// Offset of the byte within its 4 KiB page.
    #[bits(12)]
    pub page_offset: u16,
    /// Physical page number.
    #[bits(20)]
    pub phy_page_num: u32,
}

impl PhysAddr {
    /// Build a physical address from a page base address and an offset.
    ///
    /// ### Errors
    /// [`Error::BadParameter`] when `page_begin` is not 4 KiB-aligned or
    /// `page_offset` does not fit in 12 bits.
    pub fn from_page(page_begin: u32, page_offset: u16) -> Result<Self> {
        if page_begin as usize % PAGE_SIZE != 0 || page_offset >> PAGE_OFFSET_BITS != 0 {
            return Err(Error::BadParameter);
        }

        Ok(Self::new()
            .with_phy_page_num(page_begin >> PAGE_OFFSET_BITS)
            .with_page_offset(page_offset))
    }

    /// Build a physical address from a physical page number and an offset.
    ///
    /// ### Errors
    /// [`Error::BadParameter`] when either field exceeds its width.
    pub fn from_page_number(phy_page_num: u32, page_offset: u16) -> Result<Self> {
        if phy_page_num >> PHY_PAGE_NUM_BITS != 0 || page_offset >> PAGE_OFFSET_BITS != 0 {
            return Err(Error::BadParameter);
        }

        Ok(Self::new()
            .with_phy_page_num(phy_page_num)
            .with_page_offset(page_offset))
    }

    /// Reinterpret a raw 32-bit byte address.
    #[inline]
    #[must_use]
    pub const fn from_u32(v: u32) -> Self {
        Self::from_bits(v)
    }

    /// Project back to the packed 32-bit representation.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.into_bits()
    }

    /// Byte address of the first byte of the containing page.
    #[inline]
    #[must_use]
    pub const fn page_base(self) -> u32 {
        self.phy_page_num() << PAGE_OFFSET_BITS
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:08X})", self.as_u32())
    }
}

impl fmt::Display for PhysAddr {
    /// The documented dump format, e.g. `page num=0x11; offset=0xFF4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page num=0x{:X}; offset=0x{:X}",
            self.phy_page_num(),
            self.page_offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_page_splits_base_and_offset() {
        let pa = PhysAddr::from_page(0x0001_1000, 0xFF4).unwrap();
        assert_eq!(pa.phy_page_num(), 0x11);
        assert_eq!(pa.page_offset(), 0xFF4);
        assert_eq!(pa.as_u32(), 0x0001_1FF4);
        assert_eq!(pa.page_base(), 0x0001_1000);
    }

    #[test]
    fn from_page_rejects_misaligned_base() {
        assert_eq!(PhysAddr::from_page(0x123, 0), Err(Error::BadParameter));
        assert_eq!(
            PhysAddr::from_page(0x0001_1800, 0),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn from_page_rejects_oversized_offset() {
        assert_eq!(
            PhysAddr::from_page(0x0001_1000, 0x1000),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn zero_address_is_valid() {
        let pa = PhysAddr::from_page(0, 0).unwrap();
        assert_eq!(pa.as_u32(), 0);
    }

    #[test]
    fn raw_round_trip() {
        for v in [0u32, 0xFFFF_FFFF, 0x0001_1FF4, 0x8000_0000] {
            assert_eq!(PhysAddr::from_u32(v).as_u32(), v);
        }
    }

    #[test]
    fn display_uses_the_documented_format() {
        let pa = PhysAddr::from_page(0x0001_1000, 0xFF4).unwrap();
        assert_eq!(pa.to_string(), "page num=0x11; offset=0xFF4");
    }
}
