//! # Shared Simulator Types
//!
//! The small set of definitions every other crate in the workspace agrees
//! on: the flat [`Error`] taxonomy, the [`Access`] kind distinguishing
//! instruction fetches from data accesses, and the word/page geometry
//! constants of the simulated machine.
//!
//! ## Overview
//!
//! The simulated machine uses
//!
//! - 32-bit little-endian words ([`Word`]),
//! - 4 KiB pages ([`PAGE_SIZE`], [`PAGE_OFFSET_BITS`]),
//! - page directories of [`PD_ENTRIES`] 32-bit entries at every level,
//! - 36-bit virtual page numbers and 20-bit physical page numbers.
//!
//! Every fallible operation in the workspace returns [`Result`]; errors are
//! never recovered locally and bubble to the driver, which prints the
//! textual message and aborts the current command.

mod error;

pub use error::{Error, Result};

/// One machine word: 32 bits, little-endian in memory.
pub type Word = u32;

/// Bytes per [`Word`].
pub const WORD_BYTES: usize = 4;

/// Words per cache line.
pub const LINE_WORDS: usize = 4;

/// Bytes per cache line.
pub const LINE_BYTES: usize = LINE_WORDS * WORD_BYTES;

/// Number of bits of the in-page offset.
pub const PAGE_OFFSET_BITS: u32 = 12;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: usize = 1 << PAGE_OFFSET_BITS;

/// Entries per page directory, at all four levels.
pub const PD_ENTRIES: usize = 512;

/// Width of a virtual page number: four 9-bit directory indices.
pub const VIRT_PAGE_NUM_BITS: u32 = 36;

/// Width of a physical page number.
pub const PHY_PAGE_NUM_BITS: u32 = 20;

/// The kind of a memory access.
///
/// Instruction fetches and data accesses are serviced by distinct L1
/// TLBs/caches; the shared L2 levels do not distinguish them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Access {
    /// Instruction fetch (read-only).
    Instruction,
    /// Data read or write.
    Data,
}

impl Access {
    /// The kind serviced by the *other* paired L1 structure.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Instruction => Self::Data,
            Self::Data => Self::Instruction,
        }
    }
}
