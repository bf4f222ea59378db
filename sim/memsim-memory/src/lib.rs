//! # Backing Memory Image
//!
//! The flat byte-addressable memory the whole simulator runs against:
//! page directories, data pages, and everything the caches write through
//! to, all in one [`Memory`] buffer owned by the driver.
//!
//! ## Bring-up
//!
//! Two ways to seed an image, both performed once at start-up:
//!
//! - [`Memory::from_dump_file`] reads a binary file verbatim as the whole
//!   image.
//! - [`Memory::from_description_file`] builds the image from a text
//!   description: total size, a PGD page file (placed at physical 0), `N`
//!   translation page files placed at explicit physical offsets, and any
//!   number of data page files placed wherever the page tables loaded so
//!   far map their virtual address. Every page file must be exactly 4 KiB.
//!
//! ## Access
//!
//! Words are 32-bit little-endian; cache lines are four words. All
//! accessors are bounds-checked ([`Error::WrongAddress`]) and
//! alignment-checked ([`Error::BadParameter`]); writes mutate the image in
//! place and nothing here ever reorders or buffers them.
//!
//! [`Error::WrongAddress`]: memsim_types::Error::WrongAddress
//! [`Error::BadParameter`]: memsim_types::Error::BadParameter

mod dump;
mod image;
mod load;

pub use dump::AddrFmt;
pub use image::Memory;
